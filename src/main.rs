use std::path::Path;

use anyhow::Result;
use clap::Parser;

use dockver::{ConfigScanner, NativeVersionReader, compare_versions, read_dll_version};

const DLL_FILE: &str = "DockFWInfo.dll";
const CONFIG_FILE: &str = "config.ini";
const DLL_VERSION_FILE: &str = "dllVersion.txt";
const CONFIG_VERSION_FILE: &str = "configVersion.txt";

/// dockver – firmware version consistency checker
#[derive(Parser)]
#[command(name = "dockver", version, about = "Check version information.")]
struct Cli {
    /// Retrieve file properties from DockFWInfo.dll
    #[arg(short = 'a')]
    read_dll: bool,

    /// Extract the largest table number and PV value from config.ini
    #[arg(short = 'b')]
    scan_config: bool,

    /// Compare the extracted version values
    #[arg(short = 'c')]
    compare: bool,

    /// Emit the DLL properties as JSON instead of name: value lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Every step reports its own failures and the run carries on; the
    // process exit status stays zero either way.
    if cli.read_dll {
        let reader = NativeVersionReader;
        if let Err(err) = read_dll_version(
            &reader,
            Path::new(DLL_FILE),
            Path::new(DLL_VERSION_FILE),
            cli.json,
        ) {
            println!("Error reading DLL version: {err:#}");
        }
    }

    if cli.scan_config {
        let scanner = ConfigScanner::new();
        if let Err(err) = scanner.scan_config(Path::new(CONFIG_FILE), Path::new(CONFIG_VERSION_FILE))
        {
            println!("Error scanning config: {err:#}");
        }
    }

    if cli.compare {
        if let Err(err) =
            compare_versions(Path::new(CONFIG_VERSION_FILE), Path::new(DLL_VERSION_FILE))
        {
            println!("Error comparing versions: {err:#}");
        }
    }

    Ok(())
}
