// Music and sound effects driven by intents on the signal bus.

use crate::domain::ports::{AudioTrack, SoundId, Stage};
use crate::domain::signal::{Signal, SignalBus};
use crate::domain::tuning::AudioTuning;
use std::rc::Rc;
use tracing::debug;

/// Background music: a main theme whose volume rises with tension and a
/// relaxing track that is muted during scares.
pub struct Music {
    stage: Stage,
    tuning: AudioTuning,
}

impl Music {
    pub fn new(bus: &SignalBus, stage: Stage, tuning: AudioTuning) -> Rc<Music> {
        let music = Rc::new(Music { stage, tuning });
        music.music_value_down();
        music.turn_on_relax_music();

        let routes: [(Signal, fn(&Music)); 4] = [
            (Signal::TurnOnRelaxMusic, Music::turn_on_relax_music),
            (Signal::TurnOffRelaxMusic, Music::turn_off_relax_music),
            (Signal::MusicValueUp, Music::music_value_up),
            (Signal::MusicValueDown, Music::music_value_down),
        ];
        for (signal, action) in routes {
            let music = music.clone();
            bus.subscribe(signal, move || action(&music));
        }
        music
    }

    pub fn turn_on_relax_music(&self) {
        debug!("relax music on");
        self.stage
            .set_volume(AudioTrack::RelaxTheme, self.tuning.relax_on);
    }

    pub fn turn_off_relax_music(&self) {
        debug!("relax music off");
        self.stage
            .set_volume(AudioTrack::RelaxTheme, self.tuning.relax_off);
    }

    pub fn music_value_up(&self) {
        self.stage
            .set_volume(AudioTrack::MainTheme, self.tuning.main_tense);
    }

    pub fn music_value_down(&self) {
        self.stage
            .set_volume(AudioTrack::MainTheme, self.tuning.main_calm);
    }
}

/// Cafe ambience and one-shot effects.
pub struct Sfx {
    stage: Stage,
    tuning: AudioTuning,
}

impl Sfx {
    pub fn new(bus: &SignalBus, stage: Stage, tuning: AudioTuning) -> Rc<Sfx> {
        let sfx = Rc::new(Sfx { stage, tuning });
        sfx.cafe_noise_up();

        let routes: [(Signal, fn(&Sfx)); 3] = [
            (Signal::CafeNoiseVolumeUp, Sfx::cafe_noise_up),
            (Signal::CafeNoiseVolumeDown, Sfx::cafe_noise_down),
            (Signal::CustomerServed, Sfx::coins),
        ];
        for (signal, action) in routes {
            let sfx = sfx.clone();
            bus.subscribe(signal, move || action(&sfx));
        }
        sfx
    }

    pub fn cafe_noise_up(&self) {
        self.stage
            .set_volume(AudioTrack::CafeNoise, self.tuning.cafe_noise_up);
    }

    pub fn cafe_noise_down(&self) {
        self.stage
            .set_volume(AudioTrack::CafeNoise, self.tuning.cafe_noise_down);
    }

    pub fn coins(&self) {
        self.stage.play_sound(SoundId::Coins);
    }
}
