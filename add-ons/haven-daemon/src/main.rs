//! Haven daemon: runs the safety core headless and drives it from stdin.
//!
//! Platform capabilities are logged instead of performed. Type `help` for commands.

mod commands;
mod platform;

use commands::{Command, CommandError, HELP};
use haven_core::{
    AppState, BiometricSample, CannedNudgeGenerator, HaltScoreSet, HaltSession, HavenConfig,
    InMemoryMoodStore, MoodEntry, MoodStore, NudgePresenter, OpenRouterNudgeGenerator,
    PhraseCrisisClassifier, ProactiveNudgeGenerator, SessionFlags, Settings, SledMoodStore,
};
use haven_sentinel::{BiometricAdapter, LifecycleSupervisor, MoodAdapter};
use haven_voice::{ChannelRecognizer, SpeechOutput, WakeWordAdapter};
use platform::{LoggingPlatform, StreakBadges};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Daemon {
    app: Arc<AppState>,
    presenter: Arc<NudgePresenter>,
    mood: MoodAdapter,
    store: Arc<dyn MoodStore>,
    recognizer: Arc<ChannelRecognizer>,
    reflection: CannedNudgeGenerator,
    supervisor: LifecycleSupervisor,
    settings_path: PathBuf,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[haven-daemon] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HavenConfig::load().expect("load HavenConfig");
    let settings_path = std::env::var("HAVEN_SETTINGS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Settings::default_path());
    let settings = Settings::load_from_path(&settings_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %settings_path.display(), "settings not loaded; using defaults");
        Settings::default()
    });

    let daemon = build(config, settings, settings_path);
    tracing::info!(route = %daemon.app.current_route(), "Haven daemon started");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                };
                match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => daemon.execute(command).await,
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down daemon");
                break;
            }
        }
    }

    daemon.supervisor.shutdown().await;
    tracing::info!("Haven daemon stopped");
}

fn build(config: HavenConfig, settings: Settings, settings_path: PathBuf) -> Daemon {
    let store: Arc<dyn MoodStore> = match std::env::var("HAVEN_MOOD_DB") {
        Ok(path) => Arc::new(SledMoodStore::open_path(&path).expect("open mood database")),
        Err(_) => Arc::new(InMemoryMoodStore::new()),
    };
    let generator: Arc<dyn ProactiveNudgeGenerator> =
        match OpenRouterNudgeGenerator::from_env(&config.openrouter_model) {
            Some(remote) => Arc::new(remote),
            None => {
                tracing::info!("OPENROUTER_API_KEY not set; using canned nudges");
                Arc::new(CannedNudgeGenerator)
            }
        };
    let classifier =
        Arc::new(PhraseCrisisClassifier::new(&config.crisis_phrases).expect("compile crisis phrases"));

    let app = Arc::new(AppState::new(config, settings));
    let platform = Arc::new(LoggingPlatform::from_env());
    let presenter = Arc::new(NudgePresenter::new(Arc::clone(&app), platform.clone()));

    let mood = MoodAdapter::new(
        Arc::clone(&app),
        Arc::clone(&store),
        classifier,
        Arc::clone(&generator),
        Arc::clone(&presenter),
    )
    .with_badges(Arc::new(StreakBadges::new(Arc::clone(&store))));

    let biometric = Arc::new(BiometricAdapter::new(
        Arc::clone(&app),
        Arc::clone(&presenter),
        generator,
        platform.clone(),
        platform.clone(),
    ));

    let recognizer = Arc::new(ChannelRecognizer::new());
    let speech = Arc::new(SpeechOutput::new(platform.clone(), platform.clone()));
    let voice = Arc::new(WakeWordAdapter::new(
        Arc::clone(&app),
        recognizer.clone(),
        speech,
        platform,
    ));

    let supervisor = LifecycleSupervisor::start(Arc::clone(&app), Some(voice), Some(biometric));

    Daemon {
        app,
        presenter,
        mood,
        store,
        recognizer,
        reflection: CannedNudgeGenerator,
        supervisor,
        settings_path,
    }
}

impl Daemon {
    async fn execute(&self, command: Command) {
        match command {
            Command::Mood { level, note } => {
                let outcome = self.mood.submit_mood(MoodEntry::new(level, note)).await;
                println!("mood: {:?}", outcome);
                self.print_nudge();
            }
            Command::HeartRate { bpm, synced } => {
                self.app.record_biometric(BiometricSample {
                    is_synced: synced,
                    ..BiometricSample::synced(bpm)
                });
                println!("heart rate {} bpm recorded (synced: {})", bpm, synced);
            }
            Command::Go(route) => {
                self.app.navigate(route);
                println!("at {}", route);
            }
            Command::Back => println!("at {}", self.app.return_to_origin()),
            Command::Finish => println!("at {}", self.app.navigator().finish_tool()),
            Command::Say(transcript) => {
                if !self.recognizer.hear(transcript) {
                    println!("voice is not listening (login, then `set hands_free on`)");
                }
            }
            Command::Nudge(action) => println!("nudge: {:?}", self.presenter.resolve(action)),
            Command::Halt { scores, follow } => {
                if let Err(e) = self.run_halt(scores, follow).await {
                    println!("halt: {}", e);
                }
            }
            Command::Crisis { dismiss } => {
                if dismiss {
                    self.app.crisis().dismiss();
                } else {
                    self.app.crisis().open_manually();
                }
                println!("crisis: {:?}", self.app.crisis().snapshot());
            }
            Command::Set(change) => {
                self.app.update_settings(|s| change.apply(s));
                if let Err(e) = self.app.settings().save_to_path(&self.settings_path) {
                    tracing::warn!(error = %e, "failed to save settings");
                }
                println!("settings: {:?}", self.app.settings());
            }
            Command::Login => self.app.set_session(SessionFlags {
                authenticated: true,
                onboarding_complete: true,
            }),
            Command::Logout => self.app.set_session(SessionFlags::default()),
            Command::Status => self.print_status(),
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
    }

    /// Feed a full score set through the HALT session, following or skipping any offer.
    async fn run_halt(&self, scores: HaltScoreSet, follow: bool) -> Result<(), CommandError> {
        let mut session = HaltSession::new().with_exit_callback(|exit| println!("halt exit: {:?}", exit));
        for value in [scores.hunger, scores.anger, scores.lonely, scores.tired] {
            session.set_score(value)?;
            session.advance()?;
        }
        if let Some(protocol) = session.offered_protocol() {
            println!("offered: {} ({}) - {}", protocol.title, protocol.route, protocol.prompt);
            if follow {
                session.follow_protocol(&self.app)?;
                return Ok(());
            }
            session.proceed_without_protocol()?;
        }
        let entry = session.archive(self.store.as_ref())?;
        println!("archived as {}: {}", entry.mood_level, entry.note);
        let reflection = session
            .reflect(&self.reflection, self.app.config().generation_timeout())
            .await?;
        println!("{}", reflection);
        session.finish()?;
        Ok(())
    }

    fn print_nudge(&self) {
        let nudge = self.presenter.snapshot();
        if nudge.is_open {
            println!("💬 [{}] {}  (nudge call|accept|decline)", nudge.context, nudge.message);
        }
    }

    fn print_status(&self) {
        let status = serde_json::json!({
            "navigation": self.app.navigator().snapshot(),
            "nudge": self.presenter.snapshot(),
            "crisis": self.app.crisis().snapshot(),
            "settings": self.app.settings(),
            "session": self.app.session(),
            "loops": {
                "voice_running": self.supervisor.status().voice_running,
                "voice_failed": self.supervisor.status().voice_failed,
                "biometric_running": self.supervisor.status().biometric_running,
            },
            "latest_heart_rate": self.app.latest_biometric().map(|s| s.heart_rate),
        });
        println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
    }
}
