#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use predict_diabetes::config::PipelineConfig;

const ETHNICITIES: [&str; 3] = ["Caucasian", "Asian", "Hispanic"];

pub const HEADER: &str = "encounter_id,age,gender,ethnicity,height,weight,aids,cirrhosis,\
hepatic_failure,immunosuppression,leukemia,lymphoma,solid_tumor_with_metastasis,diabetes_mellitus";

pub fn is_positive(i: usize) -> bool {
    i % 10 < 3
}

pub fn height_missing(i: usize) -> bool {
    i % 11 == 5
}

/// `n` rows, 30% positive, no missing demographics, a few missing heights
/// (empty cell) and weights ("NA").
pub fn diabetes_csv(n: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..n {
        let positive = is_positive(i);
        let age = 25 + (i * 37) % 50 + if positive { 15 } else { 0 };
        let gender = if i % 2 == 0 { "M" } else { "F" };
        let ethnicity = ETHNICITIES[i % 3];
        let height = if height_missing(i) {
            String::new()
        } else {
            (150 + (i * 13) % 40).to_string()
        };
        let weight = if i % 13 == 7 {
            "NA".to_string()
        } else {
            (55 + (i * 17) % 45 + if positive { 8 } else { 0 }).to_string()
        };
        let aids = i32::from(i % 23 == 0);
        let immunosuppression = i32::from(i % 7 == 0);
        writeln!(
            csv,
            "{},{age},{gender},{ethnicity},{height},{weight},{aids},0,0,{immunosuppression},0,0,0,{}",
            1000 + i,
            i32::from(positive)
        )
        .unwrap();
    }
    csv
}

pub fn write_fixture(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("diabetes.csv");
    fs::write(&path, diabetes_csv(n)).unwrap();
    path
}

/// Default configuration pointed at a fresh fixture inside `dir`.
pub fn pipeline_config(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.data_path = write_fixture(dir, 100);
    config.model_path = dir.join("model").join("diabetes_model.json");
    config.split.test_size = 0.3;
    config.train.alpha = 0.5;
    config
}
