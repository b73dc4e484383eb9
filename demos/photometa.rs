use std::{error::Error, path::PathBuf, time::Duration};

use clap::Parser;
use photo_meta::{config, geocode::GeocodeResolver, DecodedMetadata, GeocoderConfig};
use tracing_subscriber::EnvFilter;

/// Prints the camera metadata of a JPEG photo.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// A local file, or a file name under `<base-url>/photos/`.
    photo: String,

    /// Gallery to fetch the photo from instead of reading a local file.
    #[arg(long, env = "PHOTO_META_BASE_URL")]
    base_url: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Resolve the GPS position to a place name.
    #[arg(long)]
    geocode: bool,

    #[arg(long, env = config::ENV_ENDPOINT, default_value = config::DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = config::ENV_LANGUAGE, default_value = config::DEFAULT_LANGUAGE)]
    language: String,

    /// Lookup timeout in seconds.
    #[arg(long, env = config::ENV_TIMEOUT_SECS, default_value_t = 10)]
    timeout: u64,

    /// JSON file keeping resolved places between runs.
    #[arg(long, env = config::ENV_SESSION_CACHE)]
    session_cache: Option<PathBuf>,
}

impl Cli {
    fn geocoder_config(&self) -> GeocoderConfig {
        GeocoderConfig {
            endpoint: self.endpoint.clone(),
            language: self.language.clone(),
            timeout: Duration::from_secs(self.timeout),
            session_cache: self.session_cache.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let meta = match &cli.base_url {
        Some(base) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(cli.timeout))
                .build()?;
            photo_meta::fetch_metadata(&client, base, &cli.photo).await
        }
        None => photo_meta::read_metadata_file(&cli.photo)?,
    };
    let meta = meta.unwrap_or_default();

    let place = match meta.position() {
        Some((lat, lng)) if cli.geocode => {
            let resolver = GeocodeResolver::from_config(&cli.geocoder_config()).await?;
            resolver.resolve(lat, lng).await
        }
        _ => None,
    };

    if cli.json {
        print_json(&meta, place.as_deref())?;
    } else {
        println!("{meta}");
        if let Some(place) = place {
            println!("{:<16}{place}", "Place");
        }
    }

    Ok(())
}

fn print_json(meta: &DecodedMetadata, place: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut value = serde_json::to_value(meta)?;
    if let (Some(place), Some(obj)) = (place, value.as_object_mut()) {
        obj.insert("place".to_owned(), place.into());
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
