//! The optimization pipeline: load a package, analyze every asset, show the
//! planned changes, confirm, back up, apply and save.

use std::borrow::Cow;
use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use indicatif::{HumanBytes, HumanDuration};
use tracing::{debug, warn};

use crate::analysis::{AnalysisResult, ResultSet};
use crate::asset::{file_name_of, AssetKind};
use crate::codec::{AudioCodec, ImageCodec};
use crate::error::{AssetError, ConfigError, OptimizeError, Result};
use crate::package::{Package, PackageFormat};
use crate::patcher;
use crate::policy::{SoundKind, SoundPolicy, TextureKind, TexturePolicy};
use crate::report::{AssetChange, AssetFailure, FailureStage, OptimizeReport};
use crate::status::StatusConsole;
use crate::OptimizeOptions;

/// Where the package bytes come from.
pub enum Input {
    File(PathBuf),
    Stream {
        reader: Box<dyn Read + Send>,
        /// Name shown in messages
        label: String,
    },
}

impl Input {
    pub fn stdin() -> Self {
        Input::Stream {
            reader: Box::new(io::stdin()),
            label: "<stdin>".to_string(),
        }
    }

    fn display_name(&self) -> String {
        match self {
            Input::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Input::Stream { label, .. } => label.clone(),
        }
    }
}

/// Source of the single-key answer to the confirmation prompt.
pub trait KeySource {
    /// Next key, or `None` at end of input.
    fn read_key(&mut self) -> io::Result<Option<char>>;
}

/// Line-based answers from stdin. Each key needs Enter; the first
/// non-blank character of the line is the key and the rest is ignored, so
/// `"yes"` reads as `y` and `"xy"` as `x`. A blank line reads as `'\n'`.
#[derive(Debug, Default)]
pub struct StdinKeys;

impl KeySource for StdinKeys {
    fn read_key(&mut self) -> io::Result<Option<char>> {
        read_line_key(&mut io::stdin().lock())
    }
}

fn read_line_key(reader: &mut impl BufRead) -> io::Result<Option<char>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().chars().next().unwrap_or('\n')))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Analyzed,
    Summarized,
    Confirmed,
    Applied,
    Persisted,
    Aborted,
}

#[derive(Debug)]
pub enum OptimizeOutcome {
    /// No asset needed any change. Nothing was written.
    NothingToDo,
    /// The user answered no. Nothing was written.
    Declined,
    Applied(OptimizeReport),
}

pub struct Optimizer<'a> {
    options: &'a OptimizeOptions,
    texture: TexturePolicy,
    sound: SoundPolicy,
    images: &'a dyn ImageCodec,
    audio: &'a dyn AudioCodec,
    format: &'a dyn PackageFormat,
    console: &'a StatusConsole,
    phase: Phase,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        options: &'a OptimizeOptions,
        console: &'a StatusConsole,
        images: &'a dyn ImageCodec,
        audio: &'a dyn AudioCodec,
        format: &'a dyn PackageFormat,
    ) -> Self {
        Self {
            options,
            texture: TexturePolicy {
                max_exponent: options.max_exponent,
                skip_resize: options.skip_texture_resize,
                skip_conversion: options.skip_texture_conversion,
            },
            sound: SoundPolicy,
            images,
            audio,
            format,
            console,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the whole pipeline once.
    pub fn run(&mut self, input: Input, keys: &mut dyn KeySource) -> Result<OptimizeOutcome> {
        self.phase = Phase::Idle;
        let started = Instant::now();
        let name = input.display_name();

        let output = match (&input, &self.options.output) {
            (_, Some(out)) => out.clone(),
            (Input::File(path), None) => path.clone(),
            (Input::Stream { .. }, None) => return Err(ConfigError::MissingOutput.into()),
        };
        let confirm = !self.options.skip_confirmation && matches!(input, Input::File(_));

        let (bytes, source) = self.read_input(input)?;
        let mut package = self.format.load(&bytes).map_err(OptimizeError::ArchiveLoad)?;
        drop(bytes);
        self.phase = Phase::Loaded;
        debug!(package = %name, assets = package.len(), "package loaded");

        let mut failures = Vec::new();
        let results = self.analyze(&package, &mut failures);
        self.phase = Phase::Analyzed;

        let count = results.action_count();
        if count == 0 {
            self.console
                .print(format!("Package {} does not require any optimizations.", name));
            self.phase = Phase::Aborted;
            return Ok(OptimizeOutcome::NothingToDo);
        }
        self.summarize(&name, &package, &results, count);
        self.phase = Phase::Summarized;

        if confirm && !self.confirm(keys, count)? {
            self.console.print("Aborting...");
            self.phase = Phase::Aborted;
            return Ok(OptimizeOutcome::Declined);
        }
        self.phase = Phase::Confirmed;

        let backup = match &source {
            Some(path) => Some(self.backup(path)?),
            None => None,
        };

        let size_before = package.total_size();
        let changes = self.apply(&mut package, &results, &mut failures);
        self.phase = Phase::Applied;

        self.console.set_loading("Saving package...");
        let saved = self.format.save(&package, &output);
        self.console.reset_loading();
        saved.map_err(|source| OptimizeError::Persist {
            path: output.clone(),
            source,
        })?;
        self.phase = Phase::Persisted;

        let size_after = package.total_size();
        let output_name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| output.display().to_string());
        self.console
            .print(format!("Applied {} optimizations to {}.", changes.len(), output_name));
        self.console.print(format!(
            "Asset data: {} --> {}",
            HumanBytes(size_before),
            HumanBytes(size_after)
        ));
        self.console
            .print(format!("Finished in {}.", HumanDuration(started.elapsed())));

        Ok(OptimizeOutcome::Applied(OptimizeReport {
            generated_at: Local::now(),
            input: name,
            output,
            backup,
            size_before,
            size_after,
            changes,
            failures,
        }))
    }

    /// Raw package bytes, plus the source path when the input is a file.
    fn read_input(&self, input: Input) -> Result<(Vec<u8>, Option<PathBuf>)> {
        let (bytes, source) = match input {
            Input::File(path) => {
                if !path.is_file() {
                    return Err(OptimizeError::MissingInput(path));
                }
                let bytes = fs::read(&path).map_err(OptimizeError::Read)?;
                (bytes, Some(path))
            }
            Input::Stream { mut reader, .. } => {
                self.console.set_loading("Reading the file from standard input...");
                let mut bytes = Vec::new();
                let read = reader.read_to_end(&mut bytes);
                self.console.reset_loading();
                read.map_err(OptimizeError::Read)?;
                (bytes, None)
            }
        };

        if bytes.is_empty() {
            return Err(OptimizeError::EmptyInput);
        }
        Ok((bytes, source))
    }

    fn analyze(&self, package: &Package, failures: &mut Vec<AssetFailure>) -> ResultSet {
        let total = package.len();
        let mut results = ResultSet::new();

        self.console.init_progress(0, total as u64);
        for (index, asset) in package.assets().iter().enumerate() {
            self.console
                .set_loading(format!("Analyzing the package... ({}/{})", index + 1, total));

            let skip_sounds = self.options.skip_sounds;
            let result = match asset.kind() {
                AssetKind::Dds => self
                    .texture
                    .analyze(self.images, &asset.data, TextureKind::Square)
                    .map(AnalysisResult::Image),
                AssetKind::Tga => self
                    .texture
                    .analyze(self.images, &asset.data, TextureKind::Convertible)
                    .map(AnalysisResult::Image),
                AssetKind::Mp3 if !skip_sounds => self
                    .sound
                    .analyze(self.audio, &asset.data, SoundKind::Compressed)
                    .map(AnalysisResult::Audio),
                AssetKind::Wav if !skip_sounds => self
                    .sound
                    .analyze(self.audio, &asset.data, SoundKind::Uncompressed)
                    .map(AnalysisResult::Audio),
                _ => {
                    self.console.inc_progress();
                    continue;
                }
            };

            match result {
                Ok(r) => results.insert(index, r),
                Err(e) => {
                    warn!(asset = %asset.name, error = %e, "analysis failed");
                    self.console
                        .print(format!("Failed to analyze {}: {}", asset.name, e));
                    failures.push(AssetFailure {
                        name: asset.name.clone(),
                        stage: FailureStage::Analyze,
                        error: e.to_string(),
                    });
                }
            }
            self.console.inc_progress();
        }
        self.console.reset_progress();
        self.console.reset_loading();

        debug!(analyzed = results.len(), actionable = results.action_count(), "analysis done");
        results
    }

    fn summarize(&self, name: &str, package: &Package, results: &ResultSet, count: usize) {
        self.console
            .print(format!("Package {} has {} optimizations available.", name, count));

        for (index, result) in results.actionable() {
            let Some(asset) = package.get(index) else {
                continue;
            };
            let label = asset.kind().label();
            self.console.print(format!("File: {}", asset.name));

            match result {
                AnalysisResult::Image(r) => {
                    if r.needs_conversion {
                        self.console.print(format!("   ► Format: {} --> DDS", label));
                    }
                    if let (true, Some(new_size)) = (r.needs_resizing, r.new_size) {
                        self.console
                            .print(format!("   ► Size: {} --> {}", r.old_size, new_size));
                    }
                }
                AnalysisResult::Audio(r) => {
                    if r.needs_conversion {
                        self.console.print(format!("   ► Format: {} --> MP3", label));
                    }
                    if let (true, Some(new_bitrate)) = (r.needs_bitrate_processing, r.new_bitrate) {
                        self.console.print(format!(
                            "   ► Bit Rate: {} kbps --> {} kbps",
                            r.old_bitrate / 1000,
                            new_bitrate / 1000
                        ));
                    }
                }
            }
        }
    }

    /// Ask until the answer is yes or no. End of input is a no.
    ///
    /// One prompt per key; with [`StdinKeys`] that is one prompt per line.
    fn confirm(&self, keys: &mut dyn KeySource, count: usize) -> Result<bool> {
        loop {
            self.console
                .print(format!("Would you like to apply all {} optimizations? (Y/N)", count));
            match keys.read_key().map_err(OptimizeError::Prompt)? {
                Some('y' | 'Y') => return Ok(true),
                Some('n' | 'N') | None => return Ok(false),
                Some(_) => continue,
            }
        }
    }

    /// Copy `source` to `<file name>-BACKUP` next to it, replacing an old backup.
    fn backup(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_name = format!("{}-BACKUP", file_name);
        let backup = source.with_file_name(&backup_name);

        self.console
            .set_loading(format!("Creating backup of {}...", file_name));
        let copied = (|| -> io::Result<()> {
            if backup.exists() {
                fs::remove_file(&backup)?;
            }
            fs::copy(source, &backup)?;
            Ok(())
        })();
        self.console.reset_loading();

        copied.map_err(|source| OptimizeError::Backup {
            path: backup.clone(),
            source,
        })?;
        self.console
            .print(format!("Backup has been saved as {}.", backup_name));
        debug!(backup = %backup.display(), "backup created");
        Ok(backup)
    }

    fn apply(
        &self,
        package: &mut Package,
        results: &ResultSet,
        failures: &mut Vec<AssetFailure>,
    ) -> Vec<AssetChange> {
        let total = results.action_count();
        let mut changes = Vec::with_capacity(total);

        self.console.init_progress(0, total as u64);
        for (step, (index, result)) in results.actionable().enumerate() {
            let name = package
                .get(index)
                .map(|a| a.name.clone())
                .unwrap_or_default();
            self.console.set_loading(format!(
                "Applying optimizations for {}... ({}/{})",
                name,
                step + 1,
                total
            ));

            match self.apply_one(package, index, result) {
                Ok(change) => {
                    debug!(asset = %name, renamed = ?change.new_name, "optimized");
                    changes.push(change);
                }
                Err(e) => {
                    warn!(asset = %name, error = %e, "apply failed");
                    self.console
                        .print(format!("Failed to apply optimizations for {}: {}", name, e));
                    failures.push(AssetFailure {
                        name,
                        stage: FailureStage::Apply,
                        error: e.to_string(),
                    });
                }
            }
            self.console.inc_progress();
        }
        self.console.reset_progress();
        self.console.reset_loading();

        changes
    }

    /// Transform one asset. Nothing is modified unless the transform and the
    /// rename both succeed.
    fn apply_one(
        &self,
        package: &mut Package,
        index: usize,
        result: &AnalysisResult,
    ) -> std::result::Result<AssetChange, AssetError> {
        let asset = package.get(index).ok_or(AssetError::Missing(index))?;
        let old_name = asset.name.clone();
        let size_before = asset.data.len() as u64;

        let (transformed, new_name) = match (result, asset.kind()) {
            (AnalysisResult::Image(r), AssetKind::Dds) => (
                self.texture
                    .apply(self.images, &asset.data, TextureKind::Square, r)?,
                None,
            ),
            (AnalysisResult::Image(r), AssetKind::Tga) => (
                self.texture
                    .apply(self.images, &asset.data, TextureKind::Convertible, r)?,
                r.needs_conversion.then(|| asset.renamed_extension("dds")),
            ),
            (AnalysisResult::Audio(r), AssetKind::Mp3) => (
                self.sound
                    .apply(self.audio, &asset.data, SoundKind::Compressed, r)?,
                None,
            ),
            (AnalysisResult::Audio(r), AssetKind::Wav) => (
                self.sound
                    .apply(self.audio, &asset.data, SoundKind::Uncompressed, r)?,
                r.needs_conversion.then(|| asset.renamed_extension("mp3")),
            ),
            _ => return Err(AssetError::Missing(index)),
        };
        let transformed = match transformed {
            Cow::Borrowed(_) => None,
            Cow::Owned(data) => Some(data),
        };

        if let Some(new_name) = &new_name {
            if package.find_by_name(new_name).is_some_and(|i| i != index) {
                return Err(AssetError::NameTaken(new_name.clone()));
            }
        }

        let asset = package.get_mut(index).ok_or(AssetError::Missing(index))?;
        if let Some(data) = transformed {
            asset.data = data;
        }
        let size_after = asset.data.len() as u64;

        let mut references_patched = 0;
        if let Some(new_name) = &new_name {
            asset.name = new_name.clone();
            references_patched =
                patcher::patch_level_data(package, file_name_of(&old_name), file_name_of(new_name));
        }

        Ok(AssetChange {
            index,
            name: old_name,
            new_name,
            analysis: *result,
            size_before,
            size_after,
            references_patched,
        })
    }
}
