use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::env::{apply_to_process, process_env};
use crate::error::Error;
use crate::model::{Env, LoadReport, ParseOptions};
use crate::parser::Parser;

/// Load `.env` from the current working directory into the process
/// environment.
///
/// Values are resolved against the current process environment, and keys the
/// process already has are left untouched.
///
/// # Safety
///
/// See [`apply_to_process`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    unsafe { from_path(".env") }
}

/// Load a `.env` file from a specific path into the process environment.
///
/// # Safety
///
/// See [`apply_to_process`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<LoadReport, Error> {
    unsafe { from_paths([path]) }
}

/// Load multiple `.env` files into the process environment.
///
/// Only keys assigned by the files are applied; inherited process values are
/// used for references and otherwise left alone.
///
/// # Safety
///
/// See [`apply_to_process`].
pub unsafe fn from_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut loader = EnvLoader::new().paths(paths).inherit_process_env(true);
    let loaded = loader.load()?;
    let applied = unsafe { apply_to_process(&loader.assigned_env(), false) };
    Ok(LoadReport {
        files_read: loaded.files_read,
        ..applied
    })
}

/// Builder-style dotenv loader.
///
/// All files go through one [`Parser`], so later files can reference and
/// overwrite values from earlier ones.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    required: bool,
    inherit_process_env: bool,
    options: ParseOptions,
    env: Env,
    assigned_keys: BTreeSet<String>,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// Fail on missing files when `true` (the default), skip them otherwise.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Seed the mapping from the process environment before parsing.
    ///
    /// Keys given through [`EnvLoader::seed`] take precedence over process
    /// values.
    pub fn inherit_process_env(mut self, inherit_process_env: bool) -> Self {
        self.inherit_process_env = inherit_process_env;
        self
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn seed(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    pub fn into_env(self) -> Env {
        self.env
    }

    /// Keys assigned by the loaded files, across every call to
    /// [`EnvLoader::load`].
    pub fn assigned_keys(&self) -> &BTreeSet<String> {
        &self.assigned_keys
    }

    /// The entries of the mapping that came from the loaded files, without
    /// seeded or inherited values the files left untouched.
    pub fn assigned_env(&self) -> Env {
        self.env
            .iter()
            .filter(|(key, _)| self.assigned_keys.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Parse every configured file into the loader's mapping.
    ///
    /// On error the mapping keeps whatever was applied before the failure.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let mut parser = Parser::with_env(self.take_seed(), self.options);
        let result = self.load_into(&mut parser);
        self.assigned_keys.extend(parser.assigned_keys().iter().cloned());
        self.env = parser.into_env();
        result
    }

    fn take_seed(&mut self) -> Env {
        let mut seed = std::mem::take(&mut self.env);
        if self.inherit_process_env {
            for (key, value) in process_env() {
                seed.entry(key).or_insert(value);
            }
        }
        seed
    }

    fn load_into(&self, parser: &mut Parser) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();

        for path in self.effective_paths() {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) if !self.required && err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "skipping missing dotenv file");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            report.files_read += 1;

            let content = std::str::from_utf8(&bytes)?;
            let before = parser.assignments();
            parser.parse(content)?;
            let assigned = parser.assignments() - before;
            trace!(path = %path.display(), assigned, "parsed dotenv file");
            report.loaded += assigned;
        }

        Ok(report)
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".env")]
        } else {
            self.paths.clone()
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            required: true,
            inherit_process_env: false,
            options: ParseOptions::default(),
            env: Env::new(),
            assigned_keys: BTreeSet::new(),
        }
    }
}
