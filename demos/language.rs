use anyhow::Result;
use hinglish_sentiment::core::LanguageConfig;
use hinglish_sentiment::language::{detect_languages, LanguageDetector, WhatlangDetector};

fn main() -> Result<()> {
    let config = LanguageConfig::default();
    let detector = WhatlangDetector::new();

    let texts = [
        "The camera on this phone is excellent and the battery lasts all day.",
        "yeh phone bahut accha hai but battery jaldi khatam ho jaati hai",
        "जियो का नेटवर्क आज फिर से बंद है।",
    ];

    let languages = detect_languages(&detector, &texts, &config);

    for (text, language) in texts.iter().zip(&languages) {
        let detection = detector.detect(text);
        println!(
            "{:<9} ({} @ {:.2})  {}",
            language.as_str(),
            detection.code,
            detection.confidence,
            text
        );
    }

    Ok(())
}
