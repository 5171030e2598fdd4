//! OutputWriter: renders a [`RecordSet`] and sends it to every sink of a run.
//!
//! A single [`OutputWriter::write`] call
//!
//! 1. renders the display format (and the file format, when distinct),
//! 2. prints the display rendering to the console unless quiet,
//! 3. appends the file rendering to an explicit output file,
//! 4. persists Kerberos tickets and DPAPI masterkeys on a best-effort basis.
//!
//! Steps 1 and 3 produce hard failures ([`WriteError`]). Step 4 only ever
//! produces soft results ([`Persisted`]) carried in the [`WriteOutcome`].
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::{
    paths::AppDirs,
    persist::Persisted,
    records::RecordSet,
    render::{DEFAULT_FORMAT, RenderError, RenderView, RendererRegistry},
};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write to console: {0}")]
    Console(#[source] io::Error),
}

/// Call-level configuration of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Format of the output file content; the display rendering is reused
    /// when unset.
    pub file_format: Option<String>,
    pub display_format: String,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
    pub users_only: bool,
    pub include_tickets: bool,
    pub include_masterkeys: bool,
    pub ticket_dir: Option<PathBuf>,
    pub masterkeys_file: Option<PathBuf>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            file_format: None,
            display_format: DEFAULT_FORMAT.to_string(),
            output_file: None,
            quiet: false,
            users_only: false,
            include_tickets: false,
            include_masterkeys: false,
            ticket_dir: None,
            masterkeys_file: None,
        }
    }
}

impl WriteOptions {
    pub fn view(&self) -> RenderView {
        RenderView {
            users_only: self.users_only,
            tickets: self.include_tickets,
            masterkeys: self.include_masterkeys,
        }
    }
}

/// Result of a successful write. `tickets` and `masterkeys` are `None` when
/// the conventional directory was unavailable and persistence was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub output: String,
    pub tickets: Option<Persisted>,
    pub masterkeys: Option<Persisted>,
}

pub struct OutputWriter<'a> {
    pub(crate) records: &'a RecordSet,
    registry: &'a RendererRegistry,
    pub(crate) app_dirs: Option<AppDirs>,
    console: Box<dyn Write + 'a>,
}

/// Parent directory of `path`; a bare filename lives in the current directory.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

impl<'a> OutputWriter<'a> {
    /// Writer printing to stdout and persisting under the host's
    /// conventional directory.
    pub fn new(records: &'a RecordSet, registry: &'a RendererRegistry) -> Self {
        Self {
            records,
            registry,
            app_dirs: AppDirs::detect(),
            console: Box::new(io::stdout()),
        }
    }

    pub fn with_console<W: Write + 'a>(mut self, console: W) -> Self {
        self.console = Box::new(console);
        self
    }

    pub fn with_app_dirs(mut self, app_dirs: AppDirs) -> Self {
        self.app_dirs = Some(app_dirs);
        self
    }

    /// Render the record set in `format`.
    pub fn get_output(&self, format: &str, view: &RenderView) -> Result<String, RenderError> {
        self.registry.render(format, self.records, view)
    }

    fn render_or_log(&self, format: &str, view: &RenderView) -> Result<String, WriteError> {
        self.get_output(format, view).map_err(|e| {
            error!("An error occurred while writing credentials: {}", e);
            WriteError::from(e)
        })
    }

    /// Print a status line. Console failures here are not worth failing a run.
    pub(crate) fn say(&mut self, msg: &str) {
        if let Err(e) = writeln!(self.console, "{}", msg) {
            debug!("console write failed: {}", e);
        }
    }

    pub fn write(&mut self, opts: &WriteOptions) -> Result<WriteOutcome, WriteError> {
        let view = opts.view();
        let output = self.render_or_log(&opts.display_format, &view)?;
        let file_content = match &opts.file_format {
            Some(format) => self.render_or_log(format, &view)?,
            None => output.clone(),
        };

        if !opts.quiet {
            for line in output.split('\n') {
                writeln!(self.console, "{}", line).map_err(|e| {
                    error!("Cannot write credentials to the console: {}", e);
                    WriteError::Console(e)
                })?;
            }
        }

        if let Some(path) = &opts.output_file {
            let dir = parent_dir(path);
            if !dir.is_dir() {
                error!("Directory {} does not exist", dir.display());
                return Err(WriteError::MissingDirectory(dir.to_path_buf()));
            }
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| writeln!(f, "{}", file_content));
            if let Err(source) = appended {
                error!("Cannot write credentials to {}: {}", path.display(), source);
                return Err(WriteError::Io {
                    path: path.clone(),
                    source,
                });
            }
            if !opts.quiet {
                self.say(&format!("Credentials saved to {}", path.display()));
            }
        }

        let (tickets, masterkeys) = if self.prepare_app_root() {
            (
                Some(self.write_tickets(opts.ticket_dir.as_deref(), opts.quiet)),
                Some(self.write_masterkeys(opts.masterkeys_file.as_deref(), opts.quiet)),
            )
        } else {
            (None, None)
        };

        Ok(WriteOutcome {
            output,
            tickets,
            masterkeys,
        })
    }

    /// Make sure the conventional directory exists. Failure only means that
    /// tickets and masterkeys are not persisted for this run.
    fn prepare_app_root(&self) -> bool {
        let Some(app_dirs) = &self.app_dirs else {
            debug!("no conventional directory for this host, skipping ticket/masterkey persistence");
            return false;
        };
        match app_dirs.ensure_root() {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    "cannot create {}: {}, skipping ticket/masterkey persistence",
                    app_dirs.root().display(),
                    e
                );
                false
            }
        }
    }
}
