//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mentalis::config::TrainingConfig;
use mentalis::ml::TrainerFamily;

const ANXIETY: &[&str] = &[
    "I feel anxious and my heart keeps racing",
    "So nervous about tomorrow, I can't stop worrying",
    "Constant worry and panic before every meeting",
    "My anxiety is through the roof, restless all night",
    "Panic attack again on the train, shaking and nervous",
    "I keep worrying that something terrible will happen",
    "Feeling anxious and tense, my chest is tight",
    "The worry never stops, I feel so restless",
    "Nervous sweating and racing thoughts all day",
    "Another panic attack, anxious about everything",
    "Anxious about the exam, can't calm my nerves",
    "Restless and worried, heart racing again",
    "I get nervous in crowds and start to panic",
    "Worrying constantly, anxious thoughts won't stop",
];

const DEPRESSION: &[&str] = &[
    "I feel empty and hopeless every single day",
    "Nothing matters anymore, I just feel numb",
    "Can't get out of bed, everything feels hopeless",
    "So tired of feeling sad and worthless",
    "I have lost interest in everything I used to love",
    "Crying again tonight, feeling empty inside",
    "Hopeless and alone, the sadness never lifts",
    "I feel worthless and numb, no energy at all",
    "Everything is grey and empty, I feel so sad",
    "Another day of sadness, I can't see the point",
    "Feeling numb and hopeless, lost all motivation",
    "So sad and empty, nothing brings me joy",
    "I feel worthless, the sadness is overwhelming",
    "Empty days and hopeless nights, always tired",
];

const NORMAL: &[&str] = &[
    "Had a great lunch with friends today",
    "Going for a walk in the park this afternoon",
    "Just finished a good book, really enjoyed it",
    "Looking forward to the weekend trip with family",
    "Cooked a nice dinner and watched a movie",
    "Work was productive today, feeling good",
    "The weather is lovely, went cycling this morning",
    "Enjoyed a coffee with my sister at the cafe",
    "Played football with friends, great game",
    "Planning a picnic for the weekend",
    "Visited the museum today, it was fun",
    "Nice relaxing evening at home with a movie",
    "Great day at the beach with family",
    "Finished my project at work, good feeling",
];

/// Labelled rows as `(statement, status)` pairs, classes interleaved.
pub fn sample_rows() -> Vec<(&'static str, &'static str)> {
    let mut rows = Vec::new();
    for i in 0..ANXIETY.len() {
        rows.push((ANXIETY[i], "Anxiety"));
        rows.push((DEPRESSION[i], "Depression"));
        rows.push((NORMAL[i], "Normal"));
    }
    rows
}

/// The sample rows rendered as an `Id,Statement,Status` file.
pub fn sample_csv() -> String {
    let mut csv = String::from("Id,Statement,Status\n");
    for (id, (statement, status)) in sample_rows().into_iter().enumerate() {
        csv.push_str(&format!("{},\"{}\",{}\n", id, statement, status));
    }
    csv
}

pub fn write_sample_csv(dir: &Path) -> PathBuf {
    let path = dir.join("statements.csv");
    fs::write(&path, sample_csv()).unwrap();
    path
}

/// A reduced sweep that keeps the tests fast.
pub fn small_config(model_path: PathBuf) -> TrainingConfig {
    let mut config = TrainingConfig::default();
    config.catalog.families = vec![
        TrainerFamily::SdcaMaximumEntropy,
        TrainerFamily::LbfgsMaximumEntropy,
    ];
    config.catalog.l2_grid = vec![Some(1e-2), None];
    config.cross_validation.folds = 3;
    config.model_path = model_path;
    config
}
