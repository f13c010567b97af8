use rand::{Rng, SeedableRng};
use undertone::spectrum::{self, StftParams};
use undertone::stego::{self, CarrierMap, EmbedParams};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Synthesize a five second broadband cover: a chord plus soft noise.
    let sample_rate = 16000u32;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let cover: Vec<f32> = (0..sample_rate as usize * 5)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let chord = [220.0f32, 330.0, 440.0]
                .iter()
                .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                .sum::<f32>()
                * 0.2;
            chord + rng.gen_range(-0.05f32..0.05)
        })
        .collect();

    let stft_params = StftParams::default();
    let embed_params = EmbedParams {
        hz: 4000.0,
        amplitude: -70.0,
        offset: 24,
        reader_thresh: -90.0,
        ..EmbedParams::default()
    };

    let mut spec = spectrum::stft(&cover, &stft_params)?;
    let map = CarrierMap::build(&spec.mag, sample_rate, stft_params.n_fft, &embed_params)?;
    println!(
        "Cover offers {} carrier bits across {} frames",
        map.capacity(),
        map.frames()
    );

    let message = b"hiding in the noise floor";
    let outcome = stego::embed(&mut spec.mag, &map, message, &embed_params)?;
    println!(
        "Embedded {} bits, {} cells modified",
        outcome.bits_written, outcome.modified
    );

    let recovered = stego::extract(&spec.mag, &map, &embed_params)?;
    println!("Recovered: {}", String::from_utf8_lossy(&recovered));
    assert_eq!(recovered, message);

    Ok(())
}
