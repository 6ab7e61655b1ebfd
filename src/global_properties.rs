//! Global properties are values shared by everything that runs inside one `Context`, such as
//! the run `Parameters`. Each property is a type defined with `define_global_property!` that
//! names its value type and a validation function. A value can be set once; it is validated
//! before it is stored.
//!
//! Values are usually read from a JSON file:
//!
//! ```no_run
//! use concert_contagion::global_properties::ContextGlobalPropertiesExt;
//! use concert_contagion::parameters::Parameters;
//! use concert_contagion::Context;
//!
//! let mut context = Context::new();
//! context
//!     .load_global_property_from_json(Parameters, "config.json".as_ref())
//!     .unwrap();
//! ```
use std::any::{Any, TypeId};
use std::fs;
use std::path::Path;

use log::trace;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::VaxError;
use crate::{define_data_plugin, HashMap, HashMapExt};

/// Defines a global property type with its value type and an optional validation function
/// `fn(&Value) -> Result<(), VaxError>`.
#[macro_export]
macro_rules! define_global_property {
    ($global_property:ident, $value:ty, $validate:expr) => {
        #[derive(Copy, Clone)]
        pub struct $global_property;

        impl $crate::global_properties::GlobalProperty for $global_property {
            type Value = $value;

            fn validate(value: &$value) -> Result<(), $crate::error::VaxError> {
                $validate(value)
            }
        }
    };

    ($global_property:ident, $value:ty) => {
        $crate::define_global_property!($global_property, $value, |_| Ok(()));
    };
}
pub use define_global_property;

pub trait GlobalProperty: Any {
    type Value: Any;

    fn validate(value: &Self::Value) -> Result<(), VaxError>;
}

struct GlobalPropertiesDataContainer {
    global_property_container: HashMap<TypeId, Box<dyn Any>>,
}

define_data_plugin!(
    GlobalPropertiesPlugin,
    GlobalPropertiesDataContainer,
    GlobalPropertiesDataContainer {
        global_property_container: HashMap::new(),
    }
);

/// Reads a whole JSON file into `T`.
///
/// # Errors
///
/// Returns `VaxError::IoError` if the file cannot be read and `VaxError::JsonError` if it does
/// not deserialize into `T`.
pub fn load_parameters_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T, VaxError> {
    trace!("loading parameters from {}", file_path.display());
    let config_file = fs::read_to_string(file_path)?;
    let parameters = serde_json::from_str(&config_file)?;
    Ok(parameters)
}

pub trait ContextGlobalPropertiesExt {
    /// Validates and stores `value` for `property`.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or `VaxError::InvalidParameter` if the property was
    /// already set.
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        property: T,
        value: T::Value,
    ) -> Result<(), VaxError>;

    /// Returns the value of `property`, or `None` if it was never set.
    fn get_global_property_value<T: GlobalProperty>(&self, property: T) -> Option<&T::Value>;

    /// Reads the value of `property` from a JSON file, then sets it.
    ///
    /// # Errors
    ///
    /// Propagates read, parse and validation errors.
    fn load_global_property_from_json<T: GlobalProperty>(
        &mut self,
        property: T,
        file_path: &Path,
    ) -> Result<(), VaxError>
    where
        T::Value: DeserializeOwned;
}

impl ContextGlobalPropertiesExt for Context {
    fn set_global_property_value<T: GlobalProperty>(
        &mut self,
        _property: T,
        value: T::Value,
    ) -> Result<(), VaxError> {
        T::validate(&value)?;
        let data_container = self.get_data_container_mut(GlobalPropertiesPlugin);
        match data_container.global_property_container.entry(TypeId::of::<T>()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(VaxError::InvalidParameter(
                "global property already set".to_string(),
            )),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Box::new(value));
                Ok(())
            }
        }
    }

    fn get_global_property_value<T: GlobalProperty>(&self, _property: T) -> Option<&T::Value> {
        self.get_data_container(GlobalPropertiesPlugin)?
            .global_property_container
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T::Value>())
    }

    fn load_global_property_from_json<T: GlobalProperty>(
        &mut self,
        property: T,
        file_path: &Path,
    ) -> Result<(), VaxError>
    where
        T::Value: DeserializeOwned,
    {
        let value: T::Value = load_parameters_from_json(file_path)?;
        self.set_global_property_value(property, value)
    }
}
