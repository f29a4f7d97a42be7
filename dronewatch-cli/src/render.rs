//! Plain-text frames for the terminal dashboard.

use std::fmt::Write;

use dronewatch_core::DetectionEvent;
use dronewatch_engine::{DashboardSnapshot, DataOrigin};

const RULE: &str = "------------------------------------------------------------";

pub fn frame(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let stats = &snapshot.stats;

    let _ = writeln!(out, "{}", RULE);
    if let Some(alert) = &snapshot.alert {
        let _ = writeln!(out, "!! {}", alert.message);
    }
    if snapshot.origin == DataOrigin::Fallback {
        let _ = writeln!(out, "(backend unreachable, showing local data)");
    }
    let _ = writeln!(
        out,
        "detections {}  drones {}  blocked {}  locations {}",
        stats.total_detections, stats.unique_drones, stats.blocked_drones, stats.active_locations
    );
    for manufacturer in &stats.top_manufacturers {
        let _ = writeln!(out, "  {:<28} {}", manufacturer.name, manufacturer.count);
    }

    if !snapshot.statuses.is_empty() {
        let _ = writeln!(out, "blocked:");
        for status in snapshot.statuses.iter().filter(|s| s.is_blocked) {
            let _ = writeln!(
                out,
                "  {}  x{}  last {}  {}",
                status.mac_address,
                status.detection_count,
                status.last_detected.format("%H:%M:%S"),
                status.manufacturer_name.as_deref().unwrap_or("Unknown"),
            );
        }
    }

    let _ = writeln!(out, "recent:");
    for event in &snapshot.recent {
        let _ = writeln!(out, "  {}", detection_line(event));
    }
    out.trim_end().to_string()
}

pub fn detection_line(event: &DetectionEvent) -> String {
    format!(
        "#{:<4} {}  {:>4} dBm  {}  {}  {}",
        event.id,
        event.mac_address,
        event.rssi,
        event.sensor_location,
        event.detected_at.format("%Y-%m-%d %H:%M:%S"),
        event.manufacturer_name.as_deref().unwrap_or("Unknown"),
    )
}
