//! Human-readable run summaries.

use fschurn_pipeline::{FillReport, RunStats};

pub fn print_run_summary(stats: &RunStats) {
    println!();
    println!("  Run Summary");
    println!("  ───────────────────────────────");
    println!("  Elapsed:          {:.2}s", stats.elapsed_secs);
    println!("  Traversal passes: {}", format_number(stats.traversal_passes));
    println!("  Files found:      {}", format_number(stats.files_found));
    println!("  Admitted:         {}", format_number(stats.admitted));
    println!();
    println!("  Operations:       {}", format_number(stats.operations()));
    println!("    verify-read:      {}", format_number(stats.verify_reads));
    println!("    range-read:       {}", format_number(stats.range_reads));
    println!("    range-read-write: {}", format_number(stats.range_read_writes));
    println!("    write-new:        {}", format_number(stats.writes_new));
    println!();
    println!(
        "  Read:             {} ({})",
        format_bytes(stats.bytes_read),
        throughput(stats.bytes_read, stats.elapsed_secs)
    );
    println!(
        "  Written:          {} ({})",
        format_bytes(stats.bytes_written),
        throughput(stats.bytes_written, stats.elapsed_secs)
    );
    println!("  Vanished:         {}", format_number(stats.vanished));

    if stats.walk_errors > 0 {
        println!("  ⚠️  Walk errors:     {}", format_number(stats.walk_errors));
    }
    if stats.failed_workers > 0 {
        println!("  ⚠️  Failed workers:  {}", format_number(stats.failed_workers));
    }
    if stats.integrity_violations > 0 {
        println!(
            "  ❌ Integrity violations: {}",
            format_number(stats.integrity_violations)
        );
    } else {
        println!("  ✓ No integrity violations");
    }
}

pub fn print_fill_summary(report: &FillReport) {
    println!();
    println!("  Fill Summary");
    println!("  ───────────────────────────────");
    println!("  Files written:    {}", format_number(report.files));
    println!("  Bytes written:    {}", format_bytes(report.bytes));
    if report.failed_writers > 0 {
        println!("  ⚠️  Failed writers: {}", format_number(report.failed_writers));
    }
}

fn throughput(bytes: u64, secs: f64) -> String {
    if secs <= 0.0 {
        return "-".to_string();
    }
    format!("{}/s", format_bytes((bytes as f64 / secs) as u64))
}

/// Decimal units, one place after the point: `1.5 kB`, `5.0 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 999.95 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Digits grouped in threes: `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.char_indices() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1000), "1.0 kB");
        assert_eq!(format_bytes(1536), "1.5 kB");
        assert_eq!(format_bytes(999_999), "1.0 MB");
        assert_eq!(format_bytes(5_000_000), "5.0 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.1 GB");
        assert_eq!(format_bytes(u64::MAX), "18.4 EB");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12_345), "12,345");
        assert_eq!(format_number(29_999_999), "29,999,999");
        assert_eq!(format_number(100_000_000), "100,000,000");
    }

    #[test]
    fn test_throughput() {
        assert_eq!(throughput(3000, 2.0), "1.5 kB/s");
        assert_eq!(throughput(2048, 0.0), "-");
    }
}
