//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Articulate;

/// Generate the static site
pub fn run(site: &Articulate) -> Result<()> {
    let start = std::time::Instant::now();

    let store = site.load_store()?;
    tracing::info!("Loaded {} posts", store.len());

    let theme = site.theme_preference();
    let generator = Generator::new(site)?;
    generator.generate(&store, &theme)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
