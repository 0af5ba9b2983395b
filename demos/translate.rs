use anyhow::Result;
use hinglish_sentiment::core::TranslationConfig;
use hinglish_sentiment::translate::{translate_texts, GoogleTranslator, TranslationMode};

fn main() -> Result<()> {
    let config = TranslationConfig::default();
    let translator = GoogleTranslator::new(&config)?;

    let texts = [
        "यह फोन बहुत अच्छा है लेकिन बैटरी जल्दी खत्म हो जाती है।",
        "जियो का नेटवर्क आज फिर से बंद है।",
    ];

    println!("Translating {} texts...", texts.len());
    let report = translate_texts(&translator, &texts, TranslationMode::Generic, &config);

    for (source, translated) in texts.iter().zip(&report.translated) {
        println!("\n{}\n-> {}", source, translated);
    }

    if let Some(err) = &report.error {
        println!("\nStopped after {} texts: {}", report.count(), err);
    }

    Ok(())
}
