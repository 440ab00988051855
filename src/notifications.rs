/// Cross-platform notification support
/// Currently only implements macOS notifications and sounds
use crate::persistence::settings::NotificationSettings;
use crate::pomodoro::Phase;

#[cfg(target_os = "macos")]
use std::process::Command;

/// Announce that a pomodoro phase finished, honoring the notification
/// toggles.
pub fn notify_phase_complete(finished: Phase, settings: &NotificationSettings) {
    let message = match finished {
        Phase::Work => "Work session complete - time for a break",
        Phase::ShortBreak => "Break over - back to work",
        Phase::LongBreak => "Long break over - back to work",
    };

    if settings.desktop_enabled {
        send_notification(message);
    }
    if settings.sound_enabled {
        play_sound(finished);
    }
}

fn send_notification(message: &str) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "Tempo""#,
            message.replace('"', "\\\"")
        );

        let _ = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output();
    }

    #[cfg(not(target_os = "macos"))]
    {
        // No-op on other platforms
        let _ = message;
    }
}

fn play_sound(finished: Phase) {
    #[cfg(target_os = "macos")]
    {
        let sound = match finished {
            Phase::Work => "/System/Library/Sounds/Glass.aiff",
            Phase::ShortBreak | Phase::LongBreak => "/System/Library/Sounds/Ping.aiff",
        };

        let _ = Command::new("afplay").arg(sound).output();
    }

    #[cfg(not(target_os = "macos"))]
    {
        // No-op on other platforms
        let _ = finished;
    }
}
