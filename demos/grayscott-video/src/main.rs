use anyhow::Context;
use grayscott::d2::sim::{Config, FrameError, FrameSink, Simulation};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use video_util::AviWriter;

const FPS: u32 = 12;
const RNG_SEED: u64 = 1;

/// Reports each emitted frame on stderr while passing it through.
struct Progress<S> {
    inner: S,
    emitted: usize,
    total: usize,
}

impl<S: FrameSink> FrameSink for Progress<S> {
    fn put_frame(&mut self, mask: &Array2<bool>) -> Result<(), FrameError> {
        self.inner.put_frame(mask)?;
        self.emitted += 1;
        eprint!("\r frame {} / {}", self.emitted, self.total);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::default();

    let writer = AviWriter::create("out.avi", config.cols as u32, config.rows as u32, FPS)
        .context("open video output")?;
    let mut sink = Progress {
        inner: writer,
        emitted: 0,
        total: config.frame_count(),
    };

    let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
    let mut sim = Simulation::new(config);
    sim.run(&mut rng, &mut sink)?;
    eprintln!();

    sink.inner.close().context("finalize video output")?;
    Ok(())
}
