use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

/// String properties queried from a binary's version resource.
///
/// Only the properties listed here are ever requested; a property that the
/// resource's string table does not carry stays `None`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct VersionInfo {
    #[serde(rename = "FileVersion")]
    pub file_version: Option<String>,
}

impl VersionInfo {
    /// Property pairs in query order, for the console listing.
    pub fn properties(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![("FileVersion", self.file_version.as_deref())]
    }
}

/// Capability seam over the platform's version-resource query.
pub trait VersionResourceReader {
    fn query(&self, path: &Path) -> Result<VersionInfo>;
}

/// Reader backed by the OS version APIs. Only functional on Windows.
pub struct NativeVersionReader;

#[cfg(windows)]
impl VersionResourceReader for NativeVersionReader {
    fn query(&self, path: &Path) -> Result<VersionInfo> {
        native::query(path)
    }
}

#[cfg(not(windows))]
impl VersionResourceReader for NativeVersionReader {
    fn query(&self, _path: &Path) -> Result<VersionInfo> {
        bail!("version resources can only be read on Windows")
    }
}

/// Fixed-response reader used by unit tests.
pub struct StaticVersionReader {
    pub info: VersionInfo,
}

impl VersionResourceReader for StaticVersionReader {
    fn query(&self, _path: &Path) -> Result<VersionInfo> {
        Ok(self.info.clone())
    }
}

/// Decodes the leading language id / codepage pair of a
/// `\VarFileInfo\Translation` block. The block must carry at least one
/// 4-byte entry; anything shorter is malformed.
pub fn parse_translation(block: &[u8]) -> Result<(u16, u16)> {
    if block.len() < 4 {
        bail!("Invalid translation block");
    }
    let lang = LittleEndian::read_u16(&block[0..2]);
    let codepage = LittleEndian::read_u16(&block[2..4]);
    Ok((lang, codepage))
}

/// Reads the version resource of the binary at `dll_path` and persists its
/// FileVersion string to `out_path`.
///
/// Every queried property is echoed to the console, as `name: value` lines
/// or as one JSON object when `as_json` is set. A missing input file or a
/// failed resource query is reported and the write is skipped; neither is
/// an error for the caller.
pub fn read_dll_version(
    reader: &dyn VersionResourceReader,
    dll_path: &Path,
    out_path: &Path,
    as_json: bool,
) -> Result<()> {
    if !dll_path.exists() {
        println!("File does not exist.");
        return Ok(());
    }

    let info = match reader.query(dll_path) {
        Ok(info) => info,
        Err(err) => {
            println!("Error getting file properties: {err:#}");
            println!("No properties found.");
            return Ok(());
        }
    };

    if let Some(version) = info.file_version.as_deref() {
        fs::write(out_path, version).with_context(|| format!("Writing {:?}", out_path))?;
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for (name, value) in info.properties() {
            println!("{}: {}", name, value.unwrap_or("<not present>"));
        }
    }

    Ok(())
}

#[cfg(windows)]
mod native {
    use std::ffi::OsStr;
    use std::iter;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use std::ptr;
    use std::slice;

    use anyhow::{Result, bail};
    use winapi::shared::minwindef::{LPVOID, UINT};
    use winapi::um::winver::{GetFileVersionInfoSizeW, GetFileVersionInfoW, VerQueryValueW};

    use super::{VersionInfo, parse_translation};

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(iter::once(0)).collect()
    }

    pub(super) fn query(path: &Path) -> Result<VersionInfo> {
        let wide_path = to_wide(path.as_os_str());

        let size = unsafe { GetFileVersionInfoSizeW(wide_path.as_ptr(), ptr::null_mut()) };
        if size == 0 {
            bail!("File does not contain version info");
        }

        let mut block = vec![0u8; size as usize];
        let ok = unsafe {
            GetFileVersionInfoW(wide_path.as_ptr(), 0, size, block.as_mut_ptr() as LPVOID)
        };
        if ok == 0 {
            bail!("File does not contain version info");
        }

        let Some(translation) = query_bytes(&block, r"\VarFileInfo\Translation") else {
            bail!("Invalid translation block");
        };
        let (lang, codepage) = parse_translation(translation)?;

        let sub_block = format!(r"\StringFileInfo\{lang:04x}{codepage:04x}\FileVersion");
        let file_version = query_string(&block, &sub_block);

        Ok(VersionInfo { file_version })
    }

    /// Resolves `sub_block` to raw bytes. The returned slice borrows from
    /// `block`; the length reported by the API is a byte count here.
    fn query_bytes<'a>(block: &'a [u8], sub_block: &str) -> Option<&'a [u8]> {
        let wide = to_wide(OsStr::new(sub_block));
        let mut value: LPVOID = ptr::null_mut();
        let mut len: UINT = 0;
        // SAFETY: VerQueryValueW returns a pointer into `block`, which
        // outlives the borrowed slice.
        unsafe {
            if VerQueryValueW(block.as_ptr().cast(), wide.as_ptr(), &mut value, &mut len) == 0
                || value.is_null()
            {
                return None;
            }
            Some(slice::from_raw_parts(value as *const u8, len as usize))
        }
    }

    /// Resolves `sub_block` to a string value. For string queries the API
    /// reports the length in 16-bit characters, terminator included.
    fn query_string(block: &[u8], sub_block: &str) -> Option<String> {
        let wide = to_wide(OsStr::new(sub_block));
        let mut value: LPVOID = ptr::null_mut();
        let mut len: UINT = 0;
        // SAFETY: as above, the pointer stays valid while `block` is borrowed.
        let chars = unsafe {
            if VerQueryValueW(block.as_ptr().cast(), wide.as_ptr(), &mut value, &mut len) == 0
                || value.is_null()
            {
                return None;
            }
            slice::from_raw_parts(value as *const u16, len as usize)
        };
        let text = String::from_utf16_lossy(chars);
        let text = text.trim_end_matches('\0');
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests for translation decoding and the read-and-persist operation.
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::tempdir;

    struct FailingReader;

    impl VersionResourceReader for FailingReader {
        fn query(&self, _path: &Path) -> Result<VersionInfo> {
            bail!("File does not contain version info")
        }
    }

    fn version(v: &str) -> StaticVersionReader {
        StaticVersionReader {
            info: VersionInfo {
                file_version: Some(v.to_string()),
            },
        }
    }

    #[test]
    fn translation_decodes_little_endian_pair() {
        let (lang, codepage) = parse_translation(&[0x09, 0x04, 0xE4, 0x04]).unwrap();
        assert_eq!(lang, 0x0409);
        assert_eq!(codepage, 0x04E4);
    }

    #[test]
    fn translation_rejects_short_block() {
        assert!(parse_translation(&[0x09, 0x04]).is_err());
        assert!(parse_translation(&[]).is_err());
    }

    #[test]
    fn writes_file_version_to_output() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("DockFWInfo.dll");
        let out = dir.path().join("dllVersion.txt");
        std::fs::write(&dll, b"MZ").unwrap();

        read_dll_version(&version("1.2.3.4"), &dll, &out, false).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "1.2.3.4");
    }

    #[test]
    fn missing_input_skips_operation() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("absent.dll");
        let out = dir.path().join("dllVersion.txt");

        read_dll_version(&version("1.0"), &dll, &out, false).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn query_failure_leaves_output_untouched() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("DockFWInfo.dll");
        let out = dir.path().join("dllVersion.txt");
        std::fs::write(&dll, b"MZ").unwrap();
        std::fs::write(&out, "stale").unwrap();

        read_dll_version(&FailingReader, &dll, &out, false).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "stale");
    }

    #[test]
    fn absent_file_version_writes_nothing() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("DockFWInfo.dll");
        let out = dir.path().join("dllVersion.txt");
        std::fs::write(&dll, b"MZ").unwrap();

        let reader = StaticVersionReader {
            info: VersionInfo { file_version: None },
        };
        read_dll_version(&reader, &dll, &out, false).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn repeated_runs_are_idempotent() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("DockFWInfo.dll");
        let out = dir.path().join("dllVersion.txt");
        std::fs::write(&dll, b"MZ").unwrap();

        read_dll_version(&version("7.7.7"), &dll, &out, false).unwrap();
        let first = std::fs::read(&out).unwrap();
        read_dll_version(&version("7.7.7"), &dll, &out, false).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), first);
    }

    #[test]
    fn json_listing_names_the_property() {
        let dir = tempdir().unwrap();
        let dll = dir.path().join("DockFWInfo.dll");
        let out = dir.path().join("dllVersion.txt");
        std::fs::write(&dll, b"MZ").unwrap();

        read_dll_version(&version("2.0.1"), &dll, &out, true).unwrap();

        let json = serde_json::to_value(VersionInfo {
            file_version: Some("2.0.1".to_string()),
        })
        .unwrap();
        assert_eq!(json["FileVersion"], "2.0.1");
    }

    #[cfg(not(windows))]
    #[test]
    fn native_reader_reports_unsupported_platform() {
        let err = NativeVersionReader
            .query(Path::new("DockFWInfo.dll"))
            .unwrap_err();
        assert!(err.to_string().contains("Windows"));
    }
}
