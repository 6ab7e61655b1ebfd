//! CSV reports. A report is a `Serialize` row type registered with `create_report_trait!`.
//! `add_report` opens one file per row type under the configured directory, named
//! `{prefix}{short_name}.csv`; `send_report` appends a row to it.
use std::any::TypeId;
use std::cell::RefCell;
use std::env;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use csv::Writer;
use log::trace;

use crate::context::Context;
use crate::error::VaxError;
use crate::{define_data_plugin, HashMap, HashMapExt};

pub trait Report: 'static {
    // Returns report type
    fn type_id(&self) -> TypeId;
    // Serializes the data with the correct writer
    fn serialize(&self, writer: &mut Writer<File>);
}

/// Implements `Report` for a `Serialize` row type.
#[macro_export]
macro_rules! create_report_trait {
    ($name:ident) => {
        impl $crate::report::Report for $name {
            fn type_id(&self) -> std::any::TypeId {
                std::any::TypeId::of::<$name>()
            }

            fn serialize(&self, writer: &mut $crate::csv::Writer<std::fs::File>) {
                writer.serialize(self).unwrap();
            }
        }
    };
}
pub use create_report_trait;

/// Where report files go and whether existing files may be replaced.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    file_prefix: String,
    directory: PathBuf,
    overwrite: bool,
}

impl ReportOptions {
    /// Defaults to the current directory, no prefix and no overwriting.
    #[must_use]
    pub fn new() -> ReportOptions {
        ReportOptions {
            file_prefix: String::new(),
            directory: env::current_dir().unwrap_or_default(),
            overwrite: false,
        }
    }

    pub fn file_prefix(&mut self, file_prefix: String) -> &mut ReportOptions {
        self.file_prefix = file_prefix;
        self
    }

    pub fn directory(&mut self, directory: PathBuf) -> &mut ReportOptions {
        self.directory = directory;
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn path_for(&self, short_name: &str) -> PathBuf {
        self.directory
            .join(format!("{}{short_name}.csv", self.file_prefix))
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct ReportData {
    file_writers: RefCell<HashMap<TypeId, Writer<File>>>,
    config: ReportOptions,
}

define_data_plugin!(
    ReportPlugin,
    ReportData,
    ReportData {
        file_writers: RefCell::new(HashMap::new()),
        config: ReportOptions::new(),
    }
);

pub trait ContextReportExt {
    /// Opens the file of report type `T`, creating the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `VaxError::ReportError` if the file exists and overwriting is off, and
    /// `VaxError::IoError` if the directory or the file cannot be created.
    fn add_report<T: Report>(&mut self, short_name: &str) -> Result<(), VaxError>;

    /// Appends `report` as a row of its report file.
    ///
    /// # Panics
    ///
    /// Panics if no file was added for the report type.
    fn send_report<T: Report>(&self, report: T);

    fn report_options(&mut self) -> &mut ReportOptions;
}

impl ContextReportExt for Context {
    fn add_report<T: Report>(&mut self, short_name: &str) -> Result<(), VaxError> {
        let data_container = self.get_data_container_mut(ReportPlugin);
        let path = data_container.config.path_for(short_name);
        if path.exists() && !data_container.config.overwrite {
            return Err(VaxError::ReportError(format!(
                "{} already exists; pass --force-overwrite to replace it",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        trace!("writing report to {}", path.display());
        let writer = Writer::from_writer(File::create(&path)?);
        data_container
            .file_writers
            .borrow_mut()
            .insert(TypeId::of::<T>(), writer);
        Ok(())
    }

    fn send_report<T: Report>(&self, report: T) {
        // No data container will exist if no reports have been added
        let data_container = self
            .get_data_container(ReportPlugin)
            .expect("No writer found for the report type");
        let mut writer_cell = data_container.file_writers.try_borrow_mut().unwrap();
        let writer = writer_cell
            .get_mut(&report.type_id())
            .expect("No writer found for the report type");
        report.serialize(writer);
        writer.flush().expect("Failed to flush writer");
    }

    fn report_options(&mut self) -> &mut ReportOptions {
        &mut self.get_data_container_mut(ReportPlugin).config
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize)]
    struct SampleReport {
        id: u32,
        value: String,
    }

    create_report_trait!(SampleReport);

    fn read_rows(path: PathBuf) -> Vec<SampleReport> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.deserialize().map(Result::unwrap).collect()
    }

    #[test]
    fn add_and_send_report() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(SampleReport {
            id: 1,
            value: "Value,1".to_string(),
        });
        context.send_report(SampleReport {
            id: 2,
            value: "Value\n2".to_string(),
        });

        let rows = read_rows(temp_dir.path().join("sample.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].value, "Value,1");
        assert_eq!(rows[1].value, "Value\n2");
    }

    #[test]
    fn prefix_and_nested_directory() {
        let mut context = Context::new();
        let temp_dir = tempdir().unwrap();
        let directory = temp_dir.path().join("nested").join("out");
        context
            .report_options()
            .directory(directory.clone())
            .file_prefix("trial_".to_string());
        context.add_report::<SampleReport>("sample").unwrap();
        context.send_report(SampleReport {
            id: 7,
            value: String::new(),
        });
        assert_eq!(read_rows(directory.join("trial_sample.csv"))[0].id, 7);
    }

    #[test]
    fn existing_file_requires_overwrite() {
        let temp_dir = tempdir().unwrap();
        File::create(temp_dir.path().join("sample.csv")).unwrap();

        let mut context = Context::new();
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        let result = context.add_report::<SampleReport>("sample");
        assert!(matches!(result, Err(VaxError::ReportError(_))));

        context.report_options().overwrite(true);
        assert!(context.add_report::<SampleReport>("sample").is_ok());
    }

    #[test]
    #[should_panic(expected = "No writer found for the report type")]
    fn send_report_without_adding_report() {
        let context = Context::new();
        context.send_report(SampleReport {
            id: 1,
            value: "Test Value".to_string(),
        });
    }
}
