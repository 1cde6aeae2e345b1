//! Environment readiness check.

use anyhow::Result;
use std::path::Path;
use std::process::Command;

use tender_harvest::config::{BASE_URL_ENV, DEFAULT_BASE_URL};
use tender_harvest::renderer::chromium::find_chromium;

/// Check Chromium availability, the output directory and available memory.
pub async fn run(output_dir: &Path) -> Result<()> {
    println!("tender-harvest doctor");
    println!("=====================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium_path = find_chromium();
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set TENDER_HARVEST_CHROMIUM_PATH."
        ),
    }

    let writable = output_dir_writable(output_dir);
    if writable {
        println!("[OK] Output directory {} is writable", output_dir.display());
    } else {
        println!("[!!] Output directory {} is not writable", output_dir.display());
    }

    match std::env::var(BASE_URL_ENV) {
        Ok(url) => println!("[OK] Portal URL (from {BASE_URL_ENV}): {url}"),
        Err(_) => println!("[OK] Portal URL: {DEFAULT_BASE_URL}"),
    }

    match get_available_memory_mb() {
        Some(mb) if mb >= 512 => println!("[OK] Available memory: {mb}MB (>= 512MB required)"),
        Some(mb) => println!("[!!] Available memory: {mb}MB (< 512MB, Chromium may struggle)"),
        None => println!("[??] Could not determine available memory"),
    }

    println!();
    if chromium_path.is_some() && writable {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}

fn output_dir_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".tender-harvest-probe");
    let ok = std::fs::write(&probe, b"ok").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}

/// Get available memory in MB (platform-specific).
fn get_available_memory_mb() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        let output = Command::new("sysctl")
            .args(["-n", "hw.memsize"])
            .output()
            .ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        let bytes: u64 = s.trim().parse().ok()?;
        Some(bytes / 1_048_576)
    }
    #[cfg(target_os = "linux")]
    {
        let output = Command::new("free").args(["-m"]).output().ok()?;
        let s = String::from_utf8_lossy(&output.stdout);
        s.lines()
            .find(|line| line.starts_with("Mem:"))
            .and_then(|line| line.split_whitespace().nth(6))
            .and_then(|v| v.parse().ok())
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(output_dir_writable(&dir.path().join("nested")));
        assert!(!dir.path().join("nested/.tender-harvest-probe").exists());
    }
}
