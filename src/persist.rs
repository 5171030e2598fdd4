//! Best-effort persistence of Kerberos tickets and DPAPI masterkeys.
//!
//! Nothing here fails a run: every problem becomes a [`Persisted::Skipped`]
//! with the reason, logged as a warning.
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::writer::OutputWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No tickets or masterkeys in the record set.
    NothingToWrite,
    /// No explicit destination and no conventional directory on this host.
    NoDestination,
    CannotCreateDirectory { path: PathBuf, reason: String },
    CannotWriteFile { path: PathBuf, reason: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NothingToWrite => write!(f, "nothing to write"),
            SkipReason::NoDestination => write!(f, "no destination available"),
            SkipReason::CannotCreateDirectory { path, reason } => {
                write!(f, "cannot create {}: {}", path.display(), reason)
            }
            SkipReason::CannotWriteFile { path, reason } => {
                write!(f, "cannot write {}: {}", path.display(), reason)
            }
        }
    }
}

/// Soft result of a persistence step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Written { count: usize, destination: PathBuf },
    Skipped(SkipReason),
}

impl Persisted {
    pub fn is_written(&self) -> bool {
        matches!(self, Persisted::Written { .. })
    }

    /// True when something went wrong, as opposed to having nothing to do.
    pub fn is_warning(&self) -> bool {
        matches!(self, Persisted::Skipped(r) if *r != SkipReason::NothingToWrite)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn plural(count: usize, noun: &str) -> String {
    if count > 1 {
        format!("{}s", noun)
    } else {
        noun.to_string()
    }
}

impl OutputWriter<'_> {
    /// Save every kirbi payload of every ticket to `ticket_dir`, or to the
    /// conventional tickets directory when unset.
    pub fn write_tickets(&mut self, ticket_dir: Option<&Path>, quiet: bool) -> Persisted {
        let records = self.records;
        let tickets = &records.tickets;
        let dest = match ticket_dir {
            None => match &self.app_dirs {
                Some(app_dirs) => app_dirs.tickets_dir(),
                None => return Persisted::Skipped(SkipReason::NoDestination),
            },
            Some(dir) => {
                if tickets.is_empty() && !quiet {
                    warn!("No kerberos tickets found");
                    return Persisted::Skipped(SkipReason::NothingToWrite);
                }
                absolute(dir)
            }
        };
        if tickets.is_empty() {
            return Persisted::Skipped(SkipReason::NothingToWrite);
        }

        if !dest.exists() {
            if let Err(e) = fs::create_dir_all(&dest) {
                warn!(
                    "Cannot create {} for saving kerberos tickets: {}",
                    dest.display(),
                    e
                );
                return Persisted::Skipped(SkipReason::CannotCreateDirectory {
                    path: dest,
                    reason: e.to_string(),
                });
            }
        }

        for ticket in tickets {
            for filename in ticket.filenames() {
                let path = dest.join(ticket.output_file_name(filename));
                let data = ticket.dump(filename).unwrap_or_default();
                if let Err(e) = fs::write(&path, data) {
                    warn!("Cannot write kerberos ticket {}: {}", path.display(), e);
                    return Persisted::Skipped(SkipReason::CannotWriteFile {
                        path,
                        reason: e.to_string(),
                    });
                }
                debug!("wrote {} ({} bytes)", path.display(), data.len());
            }
        }

        let count = tickets.len();
        if !quiet {
            self.say(&format!(
                "{} Kerberos {} written to {}",
                count,
                plural(count, "ticket"),
                dest.display()
            ));
        }
        Persisted::Written {
            count,
            destination: dest,
        }
    }

    /// Append masterkeys, one per line, to `masterkeys_file`, or to the
    /// conventional masterkeys file when unset.
    pub fn write_masterkeys(&mut self, masterkeys_file: Option<&Path>, quiet: bool) -> Persisted {
        let records = self.records;
        let masterkeys = &records.masterkeys;
        let dest = match masterkeys_file {
            None => match &self.app_dirs {
                Some(app_dirs) => app_dirs.masterkeys_file(),
                None => return Persisted::Skipped(SkipReason::NoDestination),
            },
            Some(file) => {
                if masterkeys.is_empty() && !quiet {
                    warn!("No DPAPI masterkey found");
                    return Persisted::Skipped(SkipReason::NothingToWrite);
                }
                absolute(file)
            }
        };
        if masterkeys.is_empty() {
            if !quiet {
                warn!("No masterkey found");
            }
            return Persisted::Skipped(SkipReason::NothingToWrite);
        }

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&dest)
            .and_then(|f| {
                let mut w = BufWriter::new(f);
                for mk in masterkeys {
                    writeln!(w, "{}", mk)?;
                }
                w.flush()
            });
        if let Err(e) = written {
            warn!("Cannot save masterkeys to {}: {}", dest.display(), e);
            return Persisted::Skipped(SkipReason::CannotWriteFile {
                path: dest,
                reason: e.to_string(),
            });
        }

        let count = masterkeys.len();
        if !quiet {
            self.say(&format!(
                "{} {} saved to {}",
                count,
                plural(count, "masterkey"),
                dest.display()
            ));
        }
        Persisted::Written {
            count,
            destination: dest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::AppDirs;
    use crate::records::RecordSet;
    use crate::render::RendererRegistry;
    use crate::ticket::KerberosTicket;
    use chrono::{TimeZone, Utc};
    use std::io;
    use tempfile::tempdir;

    fn ticket_records() -> RecordSet {
        let end = Utc.with_ymd_and_hms(2024, 11, 30, 23, 59, 58).unwrap();
        let tgs_end = Utc.with_ymd_and_hms(2024, 12, 1, 8, 0, 0).unwrap();
        RecordSet::new(
            vec![],
            vec![
                KerberosTicket::new("alice", "krbtgt/CORP.LOCAL", "CORP.LOCAL", end)
                    .with_kirbi("alice@krbtgt-CORP.LOCAL.kirbi", &[0x76, 0x82, 0x05, 0x00]),
                KerberosTicket::new("alice", "cifs/FS01", "CORP.LOCAL", tgs_end)
                    .with_kirbi("alice@cifs-FS01.kirbi", b"tgs-1")
                    .with_kirbi("alice@cifs-FS01-copy.kirbi", b"tgs-2"),
            ],
            vec![],
        )
    }

    fn is_stamped_kirbi(name: &str) -> bool {
        let Some(base) = name.strip_suffix(".kirbi") else {
            return false;
        };
        let Some((_, stamp)) = base.rsplit_once('_') else {
            return false;
        };
        stamp.len() == 14 && stamp.chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn tickets_are_written_with_expiration_in_name() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("kerberos");
        let records = ticket_records();
        let registry = RendererRegistry::new();
        let mut console = Vec::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(&mut console)
            .write_tickets(Some(dir.as_path()), false);
        assert_eq!(
            res,
            Persisted::Written {
                count: 2,
                destination: dir.clone()
            }
        );

        let tgt = fs::read(dir.join("alice@krbtgt-CORP.LOCAL_20241130235958.kirbi")).unwrap();
        assert_eq!(tgt, vec![0x76, 0x82, 0x05, 0x00]);
        let tgs = fs::read(dir.join("alice@cifs-FS01-copy_20241201080000.kirbi")).unwrap();
        assert_eq!(tgs, b"tgs-2");
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|n| is_stamped_kirbi(n)));

        let printed = String::from_utf8(console).unwrap();
        assert_eq!(
            printed,
            format!("2 Kerberos tickets written to {}\n", dir.display())
        );
    }

    #[test]
    fn single_ticket_wording() {
        let tmp = tempdir().unwrap();
        let mut records = ticket_records();
        records.tickets.truncate(1);
        let registry = RendererRegistry::new();
        let mut console = Vec::new();
        OutputWriter::new(&records, &registry)
            .with_console(&mut console)
            .write_tickets(Some(tmp.path()), false);
        let printed = String::from_utf8(console).unwrap();
        assert!(printed.starts_with("1 Kerberos ticket written to "));
    }

    #[test]
    fn empty_explicit_ticket_dir_is_untouched() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("kerberos");
        let records = RecordSet::default();
        let registry = RendererRegistry::new();
        let mut console = Vec::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(&mut console)
            .write_tickets(Some(dir.as_path()), false);
        assert_eq!(res, Persisted::Skipped(SkipReason::NothingToWrite));
        assert!(!res.is_warning());
        assert!(!dir.exists());
        assert!(console.is_empty());
    }

    #[test]
    fn conventional_ticket_dir_is_created() {
        let tmp = tempdir().unwrap();
        let app_dirs = AppDirs::new(tmp.path().join("lsassy"));
        let records = ticket_records();
        let registry = RendererRegistry::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(io::sink())
            .with_app_dirs(app_dirs.clone())
            .write_tickets(None, true);
        assert!(res.is_written());
        assert_eq!(fs::read_dir(app_dirs.tickets_dir()).unwrap().count(), 3);
    }

    #[test]
    fn ticket_names_cannot_leave_the_ticket_dir() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("kerberos");
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let absolute_key = tmp.path().join("escaped.kirbi");
        let records = RecordSet::new(
            vec![],
            vec![KerberosTicket::new("alice", "cifs/FS01", "CORP.LOCAL", end)
                .with_kirbi(&absolute_key.to_string_lossy(), b"abs")
                .with_kirbi("../up.kirbi", b"up")],
            vec![],
        );
        let registry = RendererRegistry::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(io::sink())
            .write_tickets(Some(dir.as_path()), true);
        assert!(res.is_written());

        let outside: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outside, vec!["kerberos"]);
        assert_eq!(fs::read(dir.join("escaped_20240101000000.kirbi")).unwrap(), b"abs");
        assert_eq!(fs::read(dir.join("up_20240101000000.kirbi")).unwrap(), b"up");
    }

    #[test]
    fn uncreatable_ticket_dir_is_a_warning() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();
        let records = ticket_records();
        let registry = RendererRegistry::new();
        let mut console = Vec::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(&mut console)
            .write_tickets(Some(blocker.join("tickets").as_path()), false);
        assert!(res.is_warning());
        assert!(matches!(
            res,
            Persisted::Skipped(SkipReason::CannotCreateDirectory { .. })
        ));
        assert!(console.is_empty());
    }

    #[test]
    fn masterkeys_are_appended_in_order() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("mk.txt");
        let records = RecordSet::new(
            vec![],
            vec![],
            vec!["A-GUID:deadbeef".to_string(), "B-GUID:cafef00d".to_string()],
        );
        let registry = RendererRegistry::new();
        for _ in 0..2 {
            let res = OutputWriter::new(&records, &registry)
                .with_console(io::sink())
                .write_masterkeys(Some(file.as_path()), true);
            assert!(res.is_written());
        }
        let content = fs::read_to_string(&file).unwrap();
        assert_eq!(
            content,
            "A-GUID:deadbeef\nB-GUID:cafef00d\nA-GUID:deadbeef\nB-GUID:cafef00d\n"
        );
    }

    #[test]
    fn masterkey_count_is_reported() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("mk.txt");
        let records = RecordSet::new(vec![], vec![], vec!["A-GUID:deadbeef".to_string()]);
        let registry = RendererRegistry::new();
        let mut console = Vec::new();
        OutputWriter::new(&records, &registry)
            .with_console(&mut console)
            .write_masterkeys(Some(file.as_path()), false);
        let printed = String::from_utf8(console).unwrap();
        assert_eq!(printed, format!("1 masterkey saved to {}\n", file.display()));
    }

    #[test]
    fn empty_masterkeys_touch_nothing() {
        let tmp = tempdir().unwrap();
        let app_dirs = AppDirs::new(tmp.path());
        let explicit = tmp.path().join("mk.txt");
        let records = RecordSet::default();
        let registry = RendererRegistry::new();
        for quiet in [false, true] {
            let mut writer = OutputWriter::new(&records, &registry)
                .with_console(io::sink())
                .with_app_dirs(app_dirs.clone());
            let res = writer.write_masterkeys(Some(explicit.as_path()), quiet);
            assert_eq!(res, Persisted::Skipped(SkipReason::NothingToWrite));
            let res = writer.write_masterkeys(None, quiet);
            assert_eq!(res, Persisted::Skipped(SkipReason::NothingToWrite));
        }
        assert!(!explicit.exists());
        assert!(!app_dirs.masterkeys_file().exists());
    }

    #[test]
    fn unopenable_masterkey_file_is_a_warning() {
        let tmp = tempdir().unwrap();
        let records = RecordSet::new(vec![], vec![], vec!["A-GUID:deadbeef".to_string()]);
        let registry = RendererRegistry::new();
        let res = OutputWriter::new(&records, &registry)
            .with_console(io::sink())
            .write_masterkeys(Some(tmp.path().join("missing").join("mk.txt").as_path()), true);
        assert!(matches!(
            res,
            Persisted::Skipped(SkipReason::CannotWriteFile { .. })
        ));
    }
}
