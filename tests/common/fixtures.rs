//! Static corpora used across harnesses.

/// Valid `journalctl -o json` records, each with a distinct cursor.
pub const CORPUS_JOURNAL: &[&str] = &[
    r#"{"MESSAGE":"Started Daily Cleanup of Temporary Directories.","_SYSTEMD_UNIT":"systemd-tmpfiles-clean.timer","__REALTIME_TIMESTAMP":"1705312800000000","__CURSOR":"s=j1;i=1"}"#,
    r#"{"MESSAGE":"Accepted publickey for root from 10.0.0.1","_SYSTEMD_UNIT":"sshd.service","__REALTIME_TIMESTAMP":"1705312801000000","__CURSOR":"s=j1;i=2"}"#,
    r#"{"MESSAGE":"usb 1-1: new high-speed USB device number 4","__REALTIME_TIMESTAMP":"1705312802000000","__CURSOR":"s=j1;i=3"}"#,
];

/// A line that is not JSON at all; the follower must drop it and continue.
pub const JOURNAL_GARBAGE: &str = "-- Logs begin at Mon 2024-01-15 --";

/// A decodable record with no MESSAGE field; dropped, not ingested.
pub const JOURNAL_NO_MESSAGE: &str =
    r#"{"_SYSTEMD_UNIT":"cron.service","__REALTIME_TIMESTAMP":"1705312803000000","__CURSOR":"s=j1;i=4"}"#;

/// Plain log file lines in the shape of a syslog excerpt.
pub const CORPUS_PLAIN: &[&str] = &[
    "Jan 15 10:00:00 host kernel: usb 1-1: new device",
    "Jan 15 10:00:01 host sshd[999]: Server listening on 0.0.0.0 port 22",
    "Jan 15 10:00:02 host CRON[1002]: (root) CMD (run-parts /etc/cron.hourly)",
];
