//! The compilation pipeline
//!
//! A run goes: pre hook, discover workbooks, parse (enum table first,
//! the rest in parallel), clear output directories, emit per platform,
//! post hook. Parsing shares the registries across worker threads; the
//! first failure flips a cancellation flag so queued files are skipped
//! while files already in flight finish.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use tablec_core::{EnumRegistry, Platform};
use tablec_xlsx::Workbook;

use crate::config::{Config, TargetConfig};
use crate::data;
use crate::emit::{proto, script, DATA_SUFFIX};
use crate::error::{CompileError, Result};
use crate::kinds::common::CommonTables;
use crate::kinds::error_code::ErrorCodeTables;
use crate::kinds::single::SingleTables;
use crate::kinds::{self, TableKind};
use crate::protoc;

/// Scratch files Excel leaves next to open workbooks
const LOCK_FILE_PREFIX: &str = "~$";

pub struct Compiler {
    config: Config,
    enums: EnumRegistry,
    commons: CommonTables,
    singles: SingleTables,
    error_codes: ErrorCodeTables,
    cancelled: AtomicBool,
}

impl Compiler {
    pub fn new(config: Config) -> Compiler {
        Compiler {
            config,
            enums: EnumRegistry::new(),
            commons: CommonTables::new(),
            singles: SingleTables::new(),
            error_codes: ErrorCodeTables::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    pub fn commons(&self) -> &CommonTables {
        &self.commons
    }

    pub fn singles(&self) -> &SingleTables {
        &self.singles
    }

    pub fn error_codes(&self) -> &ErrorCodeTables {
        &self.error_codes
    }

    /// All workbooks under the input root, lock files skipped, sorted
    /// for a stable parse order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let root = &self.config.input_root;
        if !root.is_dir() {
            return Err(CompileError::MissingInput(root.clone()));
        }
        let mut files = Vec::new();
        collect_xlsx(root, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn parse_file(&self, path: &Path) -> Result<()> {
        let stem = stem_of(path).unwrap_or_default();
        let workbook = Workbook::open(path)?;
        match kinds::classify(&stem) {
            TableKind::Enum => kinds::enums::parse_enum_workbook(&stem, &workbook, &self.enums),
            TableKind::ErrorCode => self.error_codes.parse_workbook(&stem, &workbook, &self.enums),
            TableKind::Single => self.singles.parse_workbook(&stem, &workbook, &self.enums),
            TableKind::Common => self.commons.parse_workbook(&stem, &workbook, &self.enums),
        }
    }

    /// Parse all workbooks into the registries.
    ///
    /// The enum table parses first and alone, since any other table's
    /// type tokens may reference its declarations. Enum failures abort
    /// immediately; for the parallel remainder all failures are logged
    /// and the first is returned.
    pub fn parse(&self, files: &[PathBuf]) -> Result<()> {
        let (enum_files, rest): (Vec<&PathBuf>, Vec<&PathBuf>) = files.iter().partition(|p| {
            stem_of(p).is_some_and(|s| kinds::classify(&s) == TableKind::Enum)
        });

        for path in enum_files {
            info!(path = %path.display(), "parsing enum table");
            self.parse_file(path)?;
        }

        // leave one core for the caller
        let threads = num_cpus::get().saturating_sub(1).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

        let failures: Mutex<Vec<CompileError>> = Mutex::new(Vec::new());
        pool.install(|| {
            rest.par_iter().for_each(|path| {
                if self.cancelled.load(Ordering::Relaxed) {
                    return;
                }
                debug!(path = %path.display(), "parsing");
                if let Err(err) = self.parse_file(path) {
                    error!(path = %path.display(), %err, "parse failed");
                    self.cancelled.store(true, Ordering::Relaxed);
                    failures.lock().expect("failure list").push(err);
                }
            });
        });

        let mut failures = failures.into_inner().expect("failure list");
        match failures.is_empty() {
            true => Ok(()),
            false => Err(failures.remove(0)),
        }
    }

    fn clear_outputs(&self) -> Result<()> {
        for platform in self.config.enabled_platforms() {
            if let Some(target) = self.config.target(platform) {
                for dir in target.output_dirs() {
                    if dir.exists() {
                        fs::remove_dir_all(dir)?;
                    }
                    fs::create_dir_all(dir)?;
                }
            }
        }
        Ok(())
    }

    fn emit_platform(&self, platform: Platform, target: &TargetConfig) -> Result<()> {
        let commons = self.commons.sorted();
        let error_header = self.error_codes.header();
        let enums = self.enums.sorted_for_platform(platform);

        let mut schema_files = Vec::new();
        match &target.schema_dir {
            Some(dir) => {
                schema_files = proto::write_schemas(
                    dir,
                    &self.config.proto_package,
                    platform,
                    &commons,
                    error_header.as_ref(),
                    &enums,
                )?;
                info!(%platform, count = schema_files.len(), "wrote schema files");
            }
            None => warn!(%platform, "schema_dir unset, skipping schema emission"),
        }

        match (&target.codegen_dir, &self.config.protoc_path) {
            (Some(out_dir), Some(protoc_path)) => {
                fs::create_dir_all(out_dir)?;
                for meta in &schema_files {
                    protoc::run_protoc(protoc_path, meta, out_dir)?;
                }
                info!(%platform, count = schema_files.len(), "generated protobuf source");
            }
            (Some(_), None) => warn!(%platform, "protoc_path unset, skipping code generation"),
            (None, _) => debug!(%platform, "codegen_dir unset, skipping code generation"),
        }

        match &target.data_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                for table in &commons {
                    let blob = data::compile_common(table, platform, &self.enums)?;
                    let path = dir.join(format!("{}{DATA_SUFFIX}", table.header.message_name));
                    fs::write(path, blob)?;
                }
                if let Some(header) = &error_header {
                    let blob = data::compile_error_code(&self.error_codes, platform, &self.enums)?;
                    fs::write(dir.join(format!("{}{DATA_SUFFIX}", header.message_name)), blob)?;
                }
                info!(%platform, tables = commons.len(), "wrote data blobs");
            }
            None => warn!(%platform, "data_dir unset, skipping data emission"),
        }

        match &target.accessor_dir {
            Some(dir) => {
                let singles = self.singles.sorted();
                let written = script::write_accessors(
                    dir,
                    &self.config.proto_package,
                    platform,
                    &commons,
                    error_header.as_ref(),
                    &singles,
                    &self.enums,
                )?;
                info!(%platform, count = written.len(), "wrote accessor classes");
            }
            None => warn!(%platform, "accessor_dir unset, skipping accessor emission"),
        }

        script::write_error_code_consts(
            target.error_code_frame_dir.as_deref(),
            target.error_code_business_dir.as_deref(),
            &self.error_codes.codes,
        )?;

        Ok(())
    }

    /// The full pipeline: hooks, parse, clear, emit.
    pub fn run(&self) -> Result<()> {
        if let Some(hook) = &self.config.pre_hook {
            protoc::run_hook(hook)?;
        }

        let files = self.discover()?;
        info!(count = files.len(), "discovered workbooks");
        self.parse(&files)?;

        self.clear_outputs()?;
        for platform in self.config.enabled_platforms() {
            if let Some(target) = self.config.target(platform) {
                self.emit_platform(platform, target)?;
            }
        }

        if let Some(hook) = &self.config.post_hook {
            protoc::run_hook(hook)?;
        }
        Ok(())
    }

    /// Parse and validate everything without writing any output.
    ///
    /// Data encoding and singleton constants are dry-run per platform so
    /// value errors surface; with no platform configured both are
    /// checked.
    pub fn check(&self) -> Result<()> {
        let files = self.discover()?;
        self.parse(&files)?;

        let mut platforms = self.config.enabled_platforms();
        if platforms.is_empty() {
            platforms = vec![Platform::Client, Platform::Server];
        }

        let commons = self.commons.sorted();
        let singles = self.singles.sorted();
        let namespace = script::csharp_namespace(&self.config.proto_package);
        for platform in platforms {
            for table in &commons {
                data::compile_common(table, platform, &self.enums)?;
            }
            if self.error_codes.header().is_some() {
                data::compile_error_code(&self.error_codes, platform, &self.enums)?;
            }
            for table in &singles {
                script::single_source(&namespace, table, platform, &self.enums)?;
            }
        }
        Ok(())
    }

    /// Delete every configured output directory.
    pub fn clean(&self) -> Result<()> {
        for platform in self.config.enabled_platforms() {
            if let Some(target) = self.config.target(platform) {
                for dir in target.output_dirs() {
                    if dir.exists() {
                        info!(dir = %dir.display(), "removing output directory");
                        fs::remove_dir_all(dir)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

fn collect_xlsx(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_xlsx(&path, files)?;
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(LOCK_FILE_PREFIX) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("xlsx") {
            files.push(path);
        }
    }
    Ok(())
}
