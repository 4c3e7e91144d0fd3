//! Basic example demonstrating the Radarly API client.
//!
//! Run with:
//! ```
//! RADARLY_ACCESS_TOKEN=your-token cargo run --example basic
//! ```

use radarly::parameters::{prelude::*, AnalyticsParameter, SearchPublicationParameter};
use radarly::{draw_structure, Find, Project, Publication, Queryable, RadarlyClient, Search, User};

#[tokio::main]
async fn main() -> radarly::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating Radarly client...");
    let client = RadarlyClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    // Current user and the projects they can read
    println!("\n--- Current User ---");
    let me = User::find(&client, "me".to_string()).await?;
    println!(
        "{} <{}>",
        me.name.as_deref().unwrap_or("unknown"),
        me.email.as_deref().unwrap_or("unknown")
    );
    for info in &me.projects {
        println!("  - {} ({})", info.label, info.id);
    }

    let Some(info) = me.projects.first() else {
        println!("No project available");
        return Ok(());
    };

    println!("\n--- Project Details ---");
    let project = Project::find(&client, info.id).await?;
    println!("Project: {}", project.label);
    println!("  Focuses: {}", project.focuses.len());
    println!("  Tags: {}", project.tags.len());
    println!("  Corpora: {}", project.corpora.len());

    // Path queries work on any entity
    let label = project.query("$.focuses[0].label")?;
    println!("  First focus: {label}");

    // Publications with a marked tone
    println!("\n--- Publications (first 50) ---");
    let mut param = SearchPublicationParameter::default_search();
    param.pagination(0, 25)?.tones(["positive", "negative"])?;
    let mut publications = Publication::fetch_all(&client, project.id, param).await?;
    println!("Found {} publications", publications.total());

    let mut shown = 0;
    while let Some(publication) = publications.next().await? {
        let platform = publication.platform().unwrap_or("unknown");
        let tone = publication.tone.as_deref().unwrap_or("-");
        println!("  {} [{platform}] {tone}", publication.uid);
        shown += 1;
        if shown == 50 {
            break;
        }
    }

    // Analytics over the same project, translated with focus labels
    println!("\n--- Analytics ---");
    let mut param = AnalyticsParameter::new();
    param.fields(["tones", "platforms"])?.interval("day")?;
    let analytics = project.get_analytics(&client, &param).await?;
    for field in analytics.fields() {
        println!("  {field}: {} terms", analytics.stats[field].len());
    }

    println!("\n--- Response Structure ---");
    let value = serde_json::to_value(&project)?;
    println!("{}", draw_structure("project", &value, 2, true));

    println!("\n{}", client.rate_limit());

    Ok(())
}
