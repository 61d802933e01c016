//! Line-oriented shell over a loaded store.
//!
//! Commands:
//!   add <title words> [rev=N] [hours=N] [prio=low|medium|high] [status=todo|doing|done] [-- notes]
//!   set <task> [title=...] [rev=N] [hours=N] [prio=...] [status=...] [-- notes]
//!   done <task>
//!   rm <task>
//!   undo
//!   forget          drop the pending undo
//!   ls [N]
//!   stats
//!   help | quit
//!
//! `<task>` is `#N` (rank in the current view), a full id, or a unique id prefix.
//! The shell owns the undo window: a pending deletion older than the configured
//! window is forgotten before the next command runs.

use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use tally_core::{Clock, NewTask, Priority, TaskPatch, TaskStatus, TaskStore};

use crate::render::{format_summary, format_table};

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Add(NewTask),
    Set { task: String, patch: TaskPatch },
    Rm(String),
    Undo,
    Forget,
    Ls(Option<usize>),
    Stats,
    Help,
    Quit,
}

const HELP: &str = "\
add <title> [rev=N] [hours=N] [prio=P] [status=S] [-- notes]
set <task> [title=T] [rev=N] [hours=N] [prio=P] [status=S] [-- notes]
done <task> | rm <task> | undo | forget | ls [N] | stats | quit
<task> is #rank, an id, or a unique id prefix";

fn parse_amount(key: &str, v: &str) -> Result<f64> {
    v.parse::<f64>()
        .with_context(|| format!("{key} expects a number, got '{v}'"))
}

fn parse_priority(v: &str) -> Result<Priority> {
    Priority::parse(v).ok_or_else(|| anyhow!("unknown priority '{v}' (low, medium, high)"))
}

fn parse_status(v: &str) -> Result<TaskStatus> {
    TaskStatus::parse(v).ok_or_else(|| anyhow!("unknown status '{v}' (todo, doing, done)"))
}

/// Split off `-- notes` and return (words, notes).
fn split_notes(rest: &str) -> (&str, Option<String>) {
    match rest.split_once(" -- ") {
        Some((head, notes)) => (head, Some(notes.trim().to_string())),
        None => match rest.strip_prefix("-- ") {
            Some(notes) => ("", Some(notes.trim().to_string())),
            None => (rest, None),
        },
    }
}

fn parse_add(rest: &str) -> Result<ShellCommand> {
    let (head, notes) = split_notes(rest);
    let mut title = Vec::new();
    let mut payload = NewTask::new("");
    for word in head.split_whitespace() {
        match word.split_once('=') {
            Some(("rev", v)) => payload.revenue = parse_amount("rev", v)?,
            Some(("hours", v)) => payload.time_taken = parse_amount("hours", v)?,
            Some(("prio", v)) => payload.priority = parse_priority(v)?,
            Some(("status", v)) => payload.status = parse_status(v)?,
            _ => title.push(word),
        }
    }
    payload.title = title.join(" ");
    payload.notes = notes;
    Ok(ShellCommand::Add(payload))
}

fn parse_set(rest: &str) -> Result<ShellCommand> {
    let (head, notes) = split_notes(rest);
    let mut words = head.split_whitespace();
    let task = words.next().context("set needs a task")?.to_string();
    let mut patch = TaskPatch::new();
    for word in words {
        let (k, v) = word
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{word}'"))?;
        match k {
            "title" => patch.title = Some(v.replace('_', " ")),
            "rev" => patch.revenue = Some(parse_amount(k, v)?),
            "hours" => patch.time_taken = Some(parse_amount(k, v)?),
            "prio" => patch.priority = Some(parse_priority(v)?),
            "status" => patch.status = Some(parse_status(v)?),
            _ => bail!("unknown field '{k}'"),
        }
    }
    if let Some(notes) = notes {
        patch.notes = Some((!notes.is_empty()).then_some(notes));
    }
    Ok(ShellCommand::Set { task, patch })
}

pub fn parse_line(line: &str) -> Result<ShellCommand> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let one_arg = |name: &str| -> Result<String> {
        if rest.is_empty() {
            bail!("{name} needs a task");
        }
        Ok(rest.to_string())
    };

    match cmd {
        "add" => parse_add(rest),
        "set" => parse_set(rest),
        "done" => Ok(ShellCommand::Set {
            task: one_arg("done")?,
            patch: TaskPatch::new().status(TaskStatus::Done),
        }),
        "rm" | "del" => Ok(ShellCommand::Rm(one_arg("rm")?)),
        "undo" => Ok(ShellCommand::Undo),
        "forget" => Ok(ShellCommand::Forget),
        "ls" => {
            let n = if rest.is_empty() {
                None
            } else {
                Some(rest.parse().with_context(|| format!("ls expects a count, got '{rest}'"))?)
            };
            Ok(ShellCommand::Ls(n))
        }
        "stats" => Ok(ShellCommand::Stats),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => bail!("unknown command '{other}' (try: help)"),
    }
}

/// Resolve `#rank`, an exact id or a unique id prefix. Anything else is passed
/// through untouched; the store treats unknown ids as no-ops.
pub fn resolve_task<C: Clock>(store: &TaskStore<C>, key: &str) -> Result<String> {
    if let Some(rank) = key.strip_prefix('#') {
        let n: usize = rank.parse().with_context(|| format!("bad rank '{key}'"))?;
        let t = n
            .checked_sub(1)
            .and_then(|i| store.view().get(i))
            .with_context(|| format!("no task ranked {key}"))?;
        return Ok(t.id.clone());
    }
    if store.get(key).is_some() {
        return Ok(key.to_string());
    }
    let mut hits = store.tasks().iter().filter(|t| t.id.starts_with(key));
    match (hits.next(), hits.next()) {
        (Some(t), None) => Ok(t.id.clone()),
        (Some(_), Some(_)) => bail!("'{key}' matches more than one task"),
        _ => Ok(key.to_string()),
    }
}

pub struct Shell<C: Clock> {
    store: TaskStore<C>,
    tz: Tz,
    undo_window: Duration,
    deleted_at: Option<Instant>,
}

impl<C: Clock> Shell<C> {
    pub fn new(store: TaskStore<C>, tz: Tz, undo_window: Duration) -> Self {
        Self {
            store,
            tz,
            undo_window,
            deleted_at: None,
        }
    }

    pub fn store(&self) -> &TaskStore<C> {
        &self.store
    }

    fn expire_undo<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let expired = self
            .deleted_at
            .is_some_and(|at| at.elapsed() > self.undo_window);
        if expired {
            self.deleted_at = None;
            if let Some(t) = self.store.last_deleted() {
                writeln!(out, "undo window for '{}' expired", t.title)?;
            }
            self.store.clear_history()?;
        }
        Ok(())
    }

    /// Run one command. Returns `false` on quit.
    pub fn execute<W: Write>(&mut self, cmd: ShellCommand, out: &mut W) -> Result<bool> {
        self.expire_undo(out)?;

        match cmd {
            ShellCommand::Add(payload) => {
                let t = self.store.add_task(payload, None)?;
                writeln!(out, "added '{}' [{}]", t.title, t.id)?;
            }
            ShellCommand::Set { task, patch } => {
                let id = resolve_task(&self.store, &task)?;
                if self.store.get(&id).is_none() {
                    writeln!(out, "no task '{task}', nothing changed")?;
                }
                self.store.update_task(&id, &patch)?;
                if let Some(t) = self.store.get(&id) {
                    writeln!(out, "updated '{}'", t.title)?;
                }
            }
            ShellCommand::Rm(task) => {
                let id = resolve_task(&self.store, &task)?;
                let title = self.store.get(&id).map(|t| t.title.clone());
                self.store.delete_task(&id)?;
                match title {
                    Some(title) => {
                        self.deleted_at = Some(Instant::now());
                        writeln!(
                            out,
                            "deleted '{title}' (undo within {}s)",
                            self.undo_window.as_secs()
                        )?;
                    }
                    None => writeln!(out, "no task '{task}', nothing deleted")?,
                }
            }
            ShellCommand::Undo => {
                self.deleted_at = None;
                match self.store.undo_delete()? {
                    Some(t) => writeln!(out, "restored '{}'", t.title)?,
                    None => writeln!(out, "nothing to undo")?,
                }
            }
            ShellCommand::Forget => {
                self.deleted_at = None;
                self.store.clear_history()?;
                writeln!(out, "undo history cleared")?;
            }
            ShellCommand::Ls(limit) => {
                let view = self.store.view();
                let rows: Vec<_> = view
                    .iter()
                    .enumerate()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|(i, t)| (i + 1, t))
                    .collect();
                write!(out, "{}", format_table(&rows, self.tz))?;
            }
            ShellCommand::Stats => {
                let m = *self.store.metrics();
                write!(out, "{}", format_summary(&m, self.store.tasks().len()))?;
            }
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands until EOF or quit. Bad commands print an error and the
    /// loop continues.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("read command")?;
            if line.trim().is_empty() {
                continue;
            }
            let outcome = parse_line(&line).and_then(|cmd| self.execute(cmd, &mut out));
            let keep_going = match outcome {
                Ok(keep_going) => keep_going,
                Err(e) => {
                    writeln!(out, "error: {e:#}")?;
                    true
                }
            };
            out.flush().ok();
            if !keep_going {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use tally_core::{SystemClock, Task, TaskGenerator};

    struct Nothing;

    impl TaskGenerator for Nothing {
        fn generate(&mut self, _: usize, _: chrono::DateTime<chrono::Utc>) -> Vec<Task> {
            Vec::new()
        }
    }

    fn shell(window: Duration) -> Shell<SystemClock> {
        let mut store = TaskStore::new();
        store.finish_load(
            Ok(vec![
                json!({ "id": "0193aa-one", "title": "First", "revenue": 100, "timeTaken": 2 }),
                json!({ "id": "0193bb-two", "title": "Second", "revenue": 50, "timeTaken": 5 }),
            ]),
            &mut Nothing,
        );
        Shell::new(store, chrono_tz::UTC, window)
    }

    fn run(shell: &mut Shell<SystemClock>, script: &str) -> String {
        let mut out = Vec::new();
        shell.run(Cursor::new(script.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_add_with_fields_and_notes() {
        let cmd = parse_line("add Fix login bug rev=200 hours=2.5 prio=high -- check staging first").unwrap();
        let ShellCommand::Add(p) = cmd else { panic!("expected add") };
        assert_eq!(p.title, "Fix login bug");
        assert_eq!(p.revenue, 200.0);
        assert_eq!(p.time_taken, 2.5);
        assert_eq!(p.priority, Priority::High);
        assert_eq!(p.notes.as_deref(), Some("check staging first"));
    }

    #[test]
    fn parses_set_and_done() {
        let cmd = parse_line("set #2 status=doing title=New_name").unwrap();
        assert_eq!(
            cmd,
            ShellCommand::Set {
                task: "#2".into(),
                patch: TaskPatch::new().title("New name").status(TaskStatus::InProgress),
            }
        );
        assert!(matches!(parse_line("done abc").unwrap(), ShellCommand::Set { .. }));
        assert!(parse_line("done").is_err());
        assert!(parse_line("set x rev=lots").is_err());
        assert!(parse_line("launch").is_err());
    }

    #[test]
    fn resolves_rank_prefix_and_exact() {
        let sh = shell(Duration::from_secs(60));
        assert_eq!(resolve_task(sh.store(), "#1").unwrap(), "0193aa-one");
        assert_eq!(resolve_task(sh.store(), "0193bb").unwrap(), "0193bb-two");
        assert_eq!(resolve_task(sh.store(), "0193aa-one").unwrap(), "0193aa-one");
        assert!(resolve_task(sh.store(), "0193").is_err());
        assert!(resolve_task(sh.store(), "#9").is_err());
        assert_eq!(resolve_task(sh.store(), "zzz").unwrap(), "zzz");
    }

    #[test]
    fn delete_then_undo_restores() {
        let mut sh = shell(Duration::from_secs(60));
        let out = run(&mut sh, "rm #1\nundo\nundo\n");
        assert!(out.contains("deleted 'First'"));
        assert!(out.contains("restored 'First'"));
        assert!(out.contains("nothing to undo"));
        assert_eq!(sh.store().tasks().len(), 2);
    }

    #[test]
    fn expired_window_forgets_deletion() {
        let mut sh = shell(Duration::ZERO);
        run(&mut sh, "rm 0193aa-one\n");
        std::thread::sleep(Duration::from_millis(5));
        let out = run(&mut sh, "undo\n");
        assert!(out.contains("undo window for 'First' expired"));
        assert!(out.contains("nothing to undo"));
        assert_eq!(sh.store().tasks().len(), 1);
    }

    #[test]
    fn errors_do_not_stop_the_loop() {
        let mut sh = shell(Duration::from_secs(60));
        let out = run(&mut sh, "bogus\nadd rev=5\nadd Real task rev=5 hours=1\nquit\nadd never\n");
        assert!(out.contains("unknown command 'bogus'"));
        assert!(out.contains("invalid task: title must not be empty"));
        assert!(out.contains("added 'Real task'"));
        assert_eq!(sh.store().tasks().len(), 3);
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_error_report_stops_the_loop() {
        for script in ["bogus\n", "rm #9\n"] {
            let mut sh = shell(Duration::from_secs(60));
            assert!(sh.run(Cursor::new(script.to_string()), Closed).is_err());
        }
    }

    #[test]
    fn done_and_stats() {
        let mut sh = shell(Duration::from_secs(60));
        let out = run(&mut sh, "done #2\nstats\n");
        assert!(out.contains("updated 'Second'"));
        assert!(out.contains("Time efficiency:  71.4%"));
        assert!(sh.store().get("0193bb-two").unwrap().completed_at.is_some());
    }

    #[test]
    fn set_on_unknown_task_is_reported_not_fatal() {
        let mut sh = shell(Duration::from_secs(60));
        let out = run(&mut sh, "set nope rev=10\n");
        assert!(out.contains("no task 'nope', nothing changed"));
    }
}
