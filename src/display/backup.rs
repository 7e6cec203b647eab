//! Backup display formatting

use crate::backup::{BackupInfo, FieldOmission, RestoreReport};

/// Format the backup directory listing
pub fn format_backup_list(backups: &[BackupInfo]) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let name_width = backups
        .iter()
        .map(|b| b.filename.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<19}  {:>7}  {:>10}\n",
        "Filename",
        "Created",
        "Version",
        "Size",
        name_width = name_width
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<19}  {:->7}  {:->10}\n",
        "",
        "",
        "",
        "",
        name_width = name_width
    ));

    for backup in backups {
        let created = backup
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        output.push_str(&format!(
            "{:<name_width$}  {:<19}  {:>7}  {:>10}\n",
            backup.filename,
            created,
            backup.version,
            format_size(backup.size_bytes),
            name_width = name_width
        ));
    }

    output
}

/// Describe fields an export could not read
///
/// Keys that simply don't exist yet are not worth reporting.
pub fn format_omissions(omissions: &[FieldOmission]) -> Option<String> {
    let unreadable: Vec<String> = omissions
        .iter()
        .filter(|o| o.is_unreadable())
        .map(|o| format!("  - {}", o))
        .collect();

    if unreadable.is_empty() {
        None
    } else {
        Some(format!("Fields left out of the backup:\n{}", unreadable.join("\n")))
    }
}

/// Summarize an import attempt
pub fn format_restore_report(report: &RestoreReport, validate_only: bool) -> String {
    let mut output = String::new();

    if report.is_fatal() {
        output.push_str("Import failed. Nothing was changed.\n");
    } else if validate_only {
        output.push_str(&format!(
            "Backup is valid. Contains: {}\n",
            join_or_none(&report.found)
        ));
    } else {
        output.push_str(&format!("Restored: {}\n", join_or_none(&report.restored)));
        if report.summaries_rebuilt {
            output.push_str("Summaries rebuilt from imported transactions.\n");
        }
    }

    if !report.issues.is_empty() {
        output.push_str(&format!("{} issue(s):\n", report.issues.len()));
        for line in report.message().lines() {
            output.push_str(&format!("  - {}\n", line));
        }
    }

    output
}

fn join_or_none(fields: &[&str]) -> String {
    if fields.is_empty() {
        "nothing".to_string()
    } else {
        fields.join(", ")
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{ImportIssue, OmissionReason};
    use crate::error::TallyError;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_omissions_only_reports_unreadable() {
        let mut omissions = vec![FieldOmission {
            field: "goals",
            reason: OmissionReason::NotFound,
        }];
        assert!(format_omissions(&omissions).is_none());

        omissions.push(FieldOmission {
            field: "firstName",
            reason: OmissionReason::Unreadable("locked".to_string()),
        });
        let text = format_omissions(&omissions).unwrap();
        assert!(text.contains("firstName: unreadable (locked)"));
        assert!(!text.contains("goals"));
    }

    #[test]
    fn test_fatal_report() {
        let report = RestoreReport {
            issues: vec![ImportIssue::Fatal(TallyError::SignatureMismatch)],
            ..Default::default()
        };
        let text = format_restore_report(&report, false);
        assert!(text.starts_with("Import failed"));
        assert!(text.contains("signature mismatch"));
    }

    #[test]
    fn test_successful_report() {
        let report = RestoreReport {
            success: true,
            restored: vec!["transactions", "accounts"],
            summaries_rebuilt: true,
            ..Default::default()
        };
        let text = format_restore_report(&report, false);
        assert!(text.contains("Restored: transactions, accounts"));
        assert!(text.contains("Summaries rebuilt"));
        assert!(!text.contains("issue"));
    }
}
