// menusync-core/src/catalog/command.rs
//! Discovery by running an external command that prints
//! `<file-name>:<Key>=<Value>` lines for the VM's applications.
use menusync_common::error::{MenuError, Result};
use menusync_common::model::VmInfo;
use tracing::{debug, warn};

use super::{DiscoveryCapability, DiscoveryOutcome, RawEntry, CAPABILITY_VERSION};
use crate::desktop;

#[derive(Debug, Clone)]
pub struct CommandDiscovery {
    argv: Vec<String>,
}

impl CommandDiscovery {
    /// `command` is split on whitespace; the VM name is appended as the last
    /// argument.
    pub fn new(command: impl AsRef<str>) -> Self {
        Self {
            argv: command
                .as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Groups output lines by file name, keeping first-seen order.
pub fn parse_listing(stdout: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut grouped: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let Some((file, rest)) = line.split_once(':') else {
            warn!("Skipping malformed discovery line: {}", line);
            continue;
        };
        let Some((key, value)) = rest.split_once('=') else {
            warn!("Skipping malformed discovery line: {}", line);
            continue;
        };
        let key = key.trim();
        if !desktop::ALLOWED_KEYS.contains(&key) {
            debug!("Dropping key '{}' for {}", key, file);
            continue;
        }
        let pair = (key.to_string(), value.trim().to_string());
        match grouped.iter_mut().find(|(f, _)| f == file) {
            Some((_, pairs)) => pairs.push(pair),
            None => grouped.push((file.to_string(), vec![pair])),
        }
    }
    grouped
}

impl DiscoveryCapability for CommandDiscovery {
    fn version(&self) -> u32 {
        CAPABILITY_VERSION
    }

    fn name(&self) -> &'static str {
        "command"
    }

    fn query(&self, vm: &VmInfo, _template: Option<&VmInfo>) -> Result<DiscoveryOutcome> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(MenuError::Config("discovery command is empty".to_string()));
        };
        let mut args = args.to_vec();
        args.push(vm.name.clone());

        let output = match menusync_aio::run_command(program, &args) {
            Ok(o) => o,
            Err(e) => return Ok(DiscoveryOutcome::Unreachable(e.to_string())),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Ok(DiscoveryOutcome::Unreachable(format!(
                "discovery exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_listing(&stdout)
            .into_iter()
            .map(|(file, pairs)| RawEntry::inline(file, desktop::build_template(&pairs)))
            .collect();
        Ok(DiscoveryOutcome::Reachable(entries))
    }
}

#[cfg(test)]
mod tests {
    use menusync_common::model::VmKind;

    use super::*;

    #[test]
    fn groups_lines_and_drops_noise() {
        let out = "evince.desktop:Name=Document Viewer\n\
                   garbage\n\
                   evince.desktop:X-GNOME-Foo=bar\n\
                   xterm.desktop:Name=XTerm\n\
                   evince.desktop:Exec=evince\n";
        let grouped = parse_listing(out);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "evince.desktop");
        assert_eq!(
            grouped[0].1,
            vec![
                ("Name".to_string(), "Document Viewer".to_string()),
                ("Exec".to_string(), "evince".to_string())
            ]
        );
    }

    #[test]
    fn runs_command_with_vm_name() {
        // with `sh -c`, the appended VM name lands in $0
        let discovery = CommandDiscovery {
            argv: vec![
                "sh".into(),
                "-c".into(),
                "printf 'a.desktop:Name=%s\\n' \"$0\"".into(),
            ],
        };
        let vm = VmInfo::new("work", VmKind::StandaloneVM);
        let DiscoveryOutcome::Reachable(entries) = discovery.query(&vm, None).unwrap() else {
            panic!("expected reachable");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a.desktop");
        let crate::catalog::TemplateSource::Inline(t) = &entries[0].template else {
            panic!("expected inline template");
        };
        assert!(t.contains("Name=%VMNAME%: work\n"));
    }

    #[test]
    fn failing_command_is_unreachable() {
        let discovery = CommandDiscovery::new("false");
        let vm = VmInfo::new("work", VmKind::StandaloneVM);
        assert!(matches!(
            discovery.query(&vm, None).unwrap(),
            DiscoveryOutcome::Unreachable(_)
        ));
    }
}
