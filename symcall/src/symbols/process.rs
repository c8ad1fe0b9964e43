///
/// Process-wide dynamic symbol table.
///
/// Looks names up in everything the dynamic loader has mapped into the
/// running process (the executable's exported symbols and every loaded
/// shared object), through a handle to the process itself.
///
/// The loader does not say whether a symbol is code or data. On Linux the
/// category is read off the permissions of the mapping containing the
/// address: executable mappings hold code, everything else holds data.
/// Elsewhere the category is left unknown and the resolver accepts it.
///

use std::ptr::NonNull;

use tracing::debug;

use super::{SymbolEntry, SymbolKind, SymbolTable};

pub struct ProcessSymbols {
    #[cfg(unix)]
    library: libloading::os::unix::Library,
}

impl ProcessSymbols {
    #[cfg(unix)]
    pub fn open() -> Self {
        Self {
            library: libloading::os::unix::Library::this(),
        }
    }

    #[cfg(not(unix))]
    pub fn open() -> Self {
        Self {}
    }
}

impl SymbolTable for ProcessSymbols {
    #[cfg(unix)]
    fn find_by_name(&self, name: &str) -> Option<SymbolEntry> {
        let c_name = std::ffi::CString::new(name).ok()?;
        let address: *mut u8 = unsafe {
            let symbol = self
                .library
                .get::<*mut u8>(c_name.as_bytes_with_nul())
                .ok()?;
            *symbol
        };
        let address = NonNull::new(address)?;
        let kind = classify(address.as_ptr() as usize);
        debug!(symbol = name, object = %owning_object(address), kind = ?kind, "found in process");
        Some(SymbolEntry { address, kind })
    }

    #[cfg(not(unix))]
    fn find_by_name(&self, _name: &str) -> Option<SymbolEntry> {
        None
    }
}

#[cfg(unix)]
fn owning_object(address: NonNull<u8>) -> String {
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let found = unsafe { libc::dladdr(address.as_ptr() as *const libc::c_void, &mut info) };
    if found == 0 || info.dli_fname.is_null() {
        return "?".to_string();
    }
    unsafe { std::ffi::CStr::from_ptr(info.dli_fname) }
        .to_string_lossy()
        .into_owned()
}

#[cfg(target_os = "linux")]
fn classify(address: usize) -> Option<SymbolKind> {
    let maps = std::fs::read_to_string("/proc/self/maps").ok()?;
    classify_in_maps(&maps, address)
}

#[cfg(not(target_os = "linux"))]
fn classify(_address: usize) -> Option<SymbolKind> {
    None
}

/// Category of `address` according to a `/proc/<pid>/maps` listing.
/// `None` when no mapping contains it.
pub fn classify_in_maps(maps: &str, address: usize) -> Option<SymbolKind> {
    for line in maps.lines() {
        let mut fields = line.split_whitespace();
        let (Some(range), Some(perms)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            usize::from_str_radix(start, 16),
            usize::from_str_radix(end, 16),
        ) else {
            continue;
        };
        if (start..end).contains(&address) {
            let executable = perms.as_bytes().get(2) == Some(&b'x');
            return Some(if executable { SymbolKind::Code } else { SymbolKind::Data });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
00400000-00452000 r-xp 00000000 08:02 173521      /usr/bin/dbus-daemon
00651000-00652000 r--p 00051000 08:02 173521      /usr/bin/dbus-daemon
00652000-00655000 rw-p 00052000 08:02 173521      /usr/bin/dbus-daemon
7fff5c3c8000-7fff5c3e9000 rw-p 00000000 00:00 0   [stack]
garbage line
";

    #[test]
    fn test_classify_in_maps() {
        assert_eq!(classify_in_maps(MAPS, 0x00400000), Some(SymbolKind::Code));
        assert_eq!(classify_in_maps(MAPS, 0x00451fff), Some(SymbolKind::Code));
        assert_eq!(classify_in_maps(MAPS, 0x00652010), Some(SymbolKind::Data));
        assert_eq!(classify_in_maps(MAPS, 0x00651000), Some(SymbolKind::Data));
        assert_eq!(classify_in_maps(MAPS, 0x00452000), None);
        assert_eq!(classify_in_maps("", 0x1000), None);
    }

    #[cfg(all(unix, target_env = "gnu"))]
    #[test]
    fn test_finds_libc_symbols() {
        let symbols = ProcessSymbols::open();

        let strlen = symbols.find_by_name("strlen").expect("strlen is exported by libc");
        assert_ne!(strlen.kind, Some(SymbolKind::Data));

        let environ = symbols.find_by_name("environ").expect("environ is exported by libc");
        assert_ne!(environ.kind, Some(SymbolKind::Code));

        assert!(symbols.find_by_name("definitely_not_a_symbol_4f1c").is_none());
    }
}
