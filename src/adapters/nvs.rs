//! NVS-backed EEPROM emulation.
//!
//! Implements [`ByteStore`] as a fixed `EEPROM_SIZE`-byte image.  Writes
//! touch a RAM copy; [`commit`](ByteStore::commit) flushes the whole image
//! as one NVS blob, so a power cut leaves either the old or the new image.
//!
//! - **`target_os = "espidf"`**: blob `eeprom` in namespace `edgenode`.
//! - **`not(target_os = "espidf")`**: committed image held in memory;
//!   [`EepromStore::committed_image`] / [`EepromStore::from_image`] simulate
//!   a restart.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::ByteStore;
use crate::config::EEPROM_SIZE;
use crate::error::StorageError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const NAMESPACE: &[u8] = b"edgenode\0";
#[cfg(target_os = "espidf")]
const BLOB_KEY: &[u8] = b"eeprom\0";

/// Erased flash reads back as `0xFF`.
const ERASED: u8 = 0xFF;

pub struct EepromStore {
    staged: [u8; EEPROM_SIZE],
    #[cfg(not(target_os = "espidf"))]
    committed: [u8; EEPROM_SIZE],
}

impl EepromStore {
    /// Open the store, initialising NVS flash if needed.
    ///
    /// On first boot or after a layout change the partition is erased.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: called once from the main task before any other NVS use.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK as i32 || unsafe { nvs_flash_init() } != ESP_OK as i32 {
                return Err(StorageError::Io);
            }
        } else if ret != ESP_OK as i32 {
            return Err(StorageError::Io);
        }

        let mut staged = [ERASED; EEPROM_SIZE];
        let loaded = Self::with_handle(false, |handle| {
            let mut size = EEPROM_SIZE;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    BLOB_KEY.as_ptr() as *const _,
                    staged.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret == ESP_OK as i32 { Ok(size) } else { Err(ret) }
        });
        match loaded {
            Ok(n) => info!("EepromStore: loaded {} bytes from NVS", n),
            Err(_) => info!("EepromStore: no stored image, starting blank"),
        }
        Ok(Self { staged })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, StorageError> {
        info!("EepromStore: simulation backend");
        Ok(Self::from_image([ERASED; EEPROM_SIZE]))
    }

    /// Rebuild a store from a previously committed image.
    #[cfg(not(target_os = "espidf"))]
    pub fn from_image(image: [u8; EEPROM_SIZE]) -> Self {
        Self {
            staged: image,
            committed: image,
        }
    }

    /// What would survive a power cut right now.
    #[cfg(not(target_os = "espidf"))]
    pub fn committed_image(&self) -> [u8; EEPROM_SIZE] {
        self.committed
    }

    #[cfg(target_os = "espidf")]
    fn with_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }
}

impl ByteStore for EepromStore {
    fn read(&self, offset: usize) -> Result<u8, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        let image = &self.committed;
        #[cfg(target_os = "espidf")]
        let image = &self.staged;

        image.get(offset).copied().ok_or(StorageError::OutOfRange)
    }

    fn write(&mut self, offset: usize, value: u8) -> Result<(), StorageError> {
        let slot = self.staged.get_mut(offset).ok_or(StorageError::OutOfRange)?;
        *slot = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.committed = self.staged;
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let staged = &self.staged;
            Self::with_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        BLOB_KEY.as_ptr() as *const _,
                        staged.as_ptr() as *const _,
                        EEPROM_SIZE,
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
            })
            .map_err(|code| {
                warn!("EepromStore: commit failed ({})", code);
                StorageError::CommitFailed
            })
        }
    }
}
