use clap::Subcommand;
use setclock_core::Config;

#[derive(Subcommand)]
pub enum SoundAction {
    /// Silence cues in future workouts
    Mute,
    /// Re-enable cues
    Unmute,
    /// Print whether cues are muted
    Status,
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    match action {
        SoundAction::Mute | SoundAction::Unmute => {
            config.sound.muted = matches!(action, SoundAction::Mute);
            config.save()?;
            println!("{}", if config.sound.muted { "muted" } else { "unmuted" });
        }
        SoundAction::Status => {
            println!("{}", if config.sound.muted { "muted" } else { "unmuted" });
        }
    }
    Ok(())
}
