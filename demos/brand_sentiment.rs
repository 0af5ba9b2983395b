use std::sync::Arc;

use anyhow::Result;
use hinglish_sentiment::brands::BrandLexicon;
use hinglish_sentiment::pipelines::brand_sentiment::*;
use hinglish_sentiment::pipelines::utils::DeviceSelectable;

fn main() -> Result<()> {
    println!("Building pipeline...");

    let lexicon = BrandLexicon::new()
        .with_aliases("Jio", &["jio", "reliance jio"])
        .with_aliases("Airtel", &["airtel", "bharti airtel"])
        .with_brand("Samsung");

    let pipeline = BrandSentimentPipelineBuilder::hinglish(Arc::new(lexicon))
        .cpu()
        .build()?;

    println!("Pipeline built successfully.");

    let texts = [
        "Jio ka network bahut slow hai, Airtel much better",
        "Samsung ka naya phone ekdum mast hai",
        "Reliance Jio ne phir se recharge mehenga kar diya",
    ];

    let results = pipeline.predict(&texts)?;

    println!("\n=== Brand Sentiment Results ===");
    for (text, brands) in texts.iter().zip(&results) {
        println!("Text: \"{}\"", text);
        if brands.is_empty() {
            println!("  (no brands found)");
        }
        for brand in brands {
            println!(
                "  {}: {} (confidence: {:.4})",
                brand.brand, brand.label_name, brand.score
            );
        }
    }

    Ok(())
}
