//! Browser-backed `KeyValueStore`s

use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};

use crate::error::StorageError;
use crate::persistence::KeyValueStore;
use crate::persistence::cookie::{format_cookie, parse_cookie};

/// `window.localStorage`. Missing in some private modes.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable - progress will not survive reloads");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StorageError> {
        self.storage.as_ref().ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(|_| StorageError::Read {
            key: key.to_string(),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|_| StorageError::Write {
                key: key.to_string(),
            })
    }
}

fn encode_component(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}

/// `None` on malformed escapes (`decodeURIComponent` throws)
fn decode_component(value: &str) -> Option<String> {
    js_sys::decode_uri_component(value).ok().map(String::from)
}

/// `document.cookie`, the identity fallback
pub struct CookieStore {
    document: Option<HtmlDocument>,
}

impl CookieStore {
    pub fn open() -> Self {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok());
        Self { document }
    }

    fn document(&self) -> Result<&HtmlDocument, StorageError> {
        self.document.as_ref().ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for CookieStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let header = self.document()?.cookie().map_err(|_| StorageError::Read {
            key: key.to_string(),
        })?;
        Ok(parse_cookie(&header, key, decode_component))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.document()?
            .set_cookie(&format_cookie(key, value, encode_component))
            .map_err(|_| StorageError::Write {
                key: key.to_string(),
            })
    }
}
