// frame_replay.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use fightlearn::reinforcement_learning::{
    Emulator, EmulatorStep, GenesisAction, RLError, RLResult,
};
use fightlearn::vision::{ChannelOrder, Dimensions2D, RawFrame};
use itertools::Itertools;
use tracing::debug;

/// Stands in for a live emulator by playing back recorded PNG frames in file name order,
/// looping forever. Actions are accepted and ignored.
pub struct FrameReplay {
    frames: Vec<PathBuf>,
    cursor: usize,
}

impl FrameReplay {
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let frames = fs::read_dir(dir)
            .with_context(|| format!("couldn't read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|extension| extension.eq_ignore_ascii_case("png"))
            })
            .sorted()
            .collect::<Vec<_>>();
        if frames.is_empty() {
            bail!("no png frames in {}", dir.display());
        }
        debug!(count = frames.len(), "loaded replay frames");
        Ok(Self { frames, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Decodes one PNG. The bytes are handed on as the emulator wrote them and labelled
    /// `Bgr`, the order the health thresholds were calibrated under.
    pub fn load<P: AsRef<Path>>(path: P) -> RLResult<RawFrame> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| RLError::Emulator(format!("{}: {e}", path.display())))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        let frame = RawFrame::from_interleaved(
            Dimensions2D::new(height as usize, width as usize),
            3,
            ChannelOrder::Bgr,
            image.as_raw(),
        )?;
        Ok(frame)
    }

    fn next_frame(&mut self) -> RLResult<(usize, RawFrame)> {
        let index = self.cursor % self.frames.len();
        self.cursor = index + 1;
        Ok((index, Self::load(&self.frames[index])?))
    }
}

impl Emulator for FrameReplay {
    /// Index of the replayed frame.
    type Info = usize;

    fn reset(&mut self) -> RLResult<RawFrame> {
        self.cursor = 0;
        let (_, frame) = self.next_frame()?;
        Ok(frame)
    }

    fn step(&mut self, _action: &GenesisAction) -> RLResult<EmulatorStep<usize>> {
        let (index, frame) = self.next_frame()?;
        Ok(EmulatorStep {
            frame,
            reward: 0.0,
            done: false,
            info: index,
        })
    }
}
