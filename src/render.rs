//! The render collaborator: whatever draws the dashboard.
//!
//! The client core only talks to it through [`Renderer`]; the binary uses
//! [`ConsoleRenderer`].

use tracing::{debug, info};

use crate::models::{AdvisoryResult, AlertRecord, HistoryRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusArea {
    Notifications,
    History,
    Advisory,
}

/// User trigger controls the core toggles while a pull call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    HistoryButton,
    AdvisoryButton,
}

pub trait Renderer: Send + Sync {
    fn render_notification(&self, record: &AlertRecord);
    fn render_history_table(&self, records: &[HistoryRecord]);
    fn render_advisory(&self, advisory: &AdvisoryResult);
    /// Replaces whatever advisory is on screen with an error message.
    fn render_advisory_error(&self, message: &str);
    fn render_status(&self, area: StatusArea, text: &str);
    fn set_control_enabled(&self, control: Control, enabled: bool);
}

/// Disables a control for its lifetime. Dropping it re-enables the control,
/// whichever way the guarded call finished.
pub struct ControlGuard<'a> {
    renderer: &'a dyn Renderer,
    control: Control,
}

impl<'a> ControlGuard<'a> {
    pub fn disable(renderer: &'a dyn Renderer, control: Control) -> Self {
        renderer.set_control_enabled(control, false);
        Self { renderer, control }
    }
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        self.renderer.set_control_enabled(self.control, true);
    }
}

pub struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render_notification(&self, record: &AlertRecord) {
        let marker = if record.is_synthetic { "!!" } else { "**" };
        println!(
            "{} {} (detected {})",
            marker,
            record.video_filename,
            record.display_timestamp()
        );
    }

    fn render_history_table(&self, records: &[HistoryRecord]) {
        println!("{:>6}  {:<25}  {:<40}  {}", "ID", "DETECTED", "VIDEO", "LOGGED");
        for r in records {
            println!(
                "{:>6}  {:<25}  {:<40}  {}",
                r.id,
                r.detection_timestamp.format("%Y-%m-%d %H:%M:%S"),
                r.video_filename,
                r.created_at.format("%Y-%m-%d %H:%M:%S"),
            );
        }
    }

    fn render_advisory(&self, advisory: &AdvisoryResult) {
        let visibility = advisory
            .visibility_km
            .map(|v| format!("{} km", v))
            .unwrap_or_else(|| "N/A".to_string());
        println!("Weather:    {}", advisory.weather_description);
        println!("Visibility: {}", visibility);
        println!("Raining:    {}", if advisory.is_raining { "yes" } else { "no" });
        if let Some(chance) = advisory.chance_of_rain {
            println!("Rain:       {}%", chance);
        }
        println!("Safe speed: {:.0} km/h", advisory.safe_speed_kmh);
        println!("Location:   {}", advisory.location_used);
    }

    fn render_advisory_error(&self, message: &str) {
        println!("Advisory unavailable: {}", message);
    }

    fn render_status(&self, area: StatusArea, text: &str) {
        info!(?area, "{}", text);
    }

    fn set_control_enabled(&self, control: Control, enabled: bool) {
        debug!(?control, enabled, "control toggled");
    }
}
