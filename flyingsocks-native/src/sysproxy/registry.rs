use std::{ffi::c_void, mem};

use windows::{
    Win32::{
        Foundation::{ERROR_MORE_DATA, ERROR_SUCCESS, WIN32_ERROR},
        System::Registry::{
            HKEY, HKEY_CURRENT_USER, KEY_ALL_ACCESS, KEY_WOW64_64KEY, REG_DWORD,
            REG_SZ, RRF_RT_REG_DWORD, RRF_RT_REG_SZ, RegCloseKey, RegGetValueW,
            RegOpenKeyExW, RegSetValueExW,
        },
    },
    core::PCWSTR,
};

use super::{
    INTERNET_SETTINGS_SUBKEY,
    store::{QueryError, SettingsKey, SettingsStore},
};

/// The per-user registry, `HKEY_CURRENT_USER`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStore;

impl SettingsStore for RegistryStore {
    type Key = RegistryKey;

    fn open(&self) -> Result<RegistryKey, u32> {
        let subkey = to_wide(INTERNET_SETTINGS_SUBKEY);
        let mut hkey = HKEY::default();
        // full access for reads as well
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                Some(0),
                KEY_ALL_ACCESS | KEY_WOW64_64KEY,
                &mut hkey,
            )
        };
        check(status)?;
        Ok(RegistryKey(hkey))
    }
}

/// An open handle to the Internet Settings key, closed on drop.
#[derive(Debug)]
pub struct RegistryKey(HKEY);

impl Drop for RegistryKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

impl SettingsKey for RegistryKey {
    fn get_dword(&self, value: &str) -> Result<u32, u32> {
        let name = to_wide(value);
        let mut data = 0u32;
        let mut size = mem::size_of::<u32>() as u32;
        let status = unsafe {
            RegGetValueW(
                self.0,
                PCWSTR::null(),
                PCWSTR(name.as_ptr()),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut data as *mut u32 as *mut c_void),
                Some(&mut size as *mut u32),
            )
        };
        check(status)?;
        Ok(data)
    }

    fn set_dword(&self, value: &str, data: u32) -> Result<(), u32> {
        let name = to_wide(value);
        let status = unsafe {
            RegSetValueExW(
                self.0,
                PCWSTR(name.as_ptr()),
                None,
                REG_DWORD,
                Some(data.to_le_bytes().as_slice()),
            )
        };
        check(status)
    }

    fn query_string(&self, value: &str, buf: &mut [u16]) -> Result<usize, QueryError> {
        let name = to_wide(value);
        let mut size = (buf.len() * mem::size_of::<u16>()) as u32;
        let status = unsafe {
            RegGetValueW(
                self.0,
                PCWSTR::null(),
                PCWSTR(name.as_ptr()),
                RRF_RT_REG_SZ,
                None,
                Some(buf.as_mut_ptr() as *mut c_void),
                Some(&mut size as *mut u32),
            )
        };
        // size is in bytes and includes the terminator
        let units = (size as usize).div_ceil(mem::size_of::<u16>());
        if status == ERROR_SUCCESS {
            Ok(units)
        } else if status == ERROR_MORE_DATA {
            Err(QueryError::MoreData { required: units })
        } else {
            Err(QueryError::Os(status.0))
        }
    }

    fn set_string(&self, value: &str, data: &str) -> Result<(), u32> {
        let name = to_wide(value);
        let bytes: Vec<u8> = to_wide(data)
            .into_iter()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let status = unsafe {
            RegSetValueExW(
                self.0,
                PCWSTR(name.as_ptr()),
                None,
                REG_SZ,
                Some(bytes.as_slice()),
            )
        };
        check(status)
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn check(status: WIN32_ERROR) -> Result<(), u32> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(status.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_nul_terminated() {
        assert_eq!(to_wide(""), vec![0]);
        assert_eq!(to_wide("a;b"), vec![b'a' as u16, b';' as u16, b'b' as u16, 0]);
    }
}
