use crate::classify::{CLASS_COLORS, CLASS_NAMES};
use crate::utils::error::ClassifierError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write;

/// 单个类别的排序结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// 类别名称
    pub class_name: String,
    /// 原始概率 (0.0 - 1.0)
    pub probability: f32,
    /// 百分比文本，保留两位小数
    pub percentage: String,
    /// 展示颜色
    pub color: String,
}

/// 一次分类的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    /// 最高概率的类别
    pub predicted_class: String,
    /// 最高概率
    pub confidence: f32,
    /// 最高概率的百分比文本
    pub confidence_percentage: String,
    /// 按概率降序排列的全部类别
    pub all_results: Vec<RankedResult>,
}

/// 结果排序器
pub struct ResultRanker;

impl ResultRanker {
    /// 将概率向量转换为带标签、按概率降序排列的结果
    pub fn rank(probabilities: &[f32]) -> Result<ClassificationOutcome> {
        if probabilities.len() != CLASS_NAMES.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: CLASS_NAMES.len(),
                got: probabilities.len(),
            });
        }

        if let Some(index) = probabilities.iter().position(|p| !p.is_finite()) {
            return Err(ClassifierError::InvalidInput(format!(
                "Non-finite probability {} for class {}",
                probabilities[index], CLASS_NAMES[index]
            )));
        }

        // 相同最大值取第一个
        let mut max_idx = 0;
        for (i, &prob) in probabilities.iter().enumerate().skip(1) {
            if prob > probabilities[max_idx] {
                max_idx = i;
            }
        }
        let confidence = probabilities[max_idx];

        let mut all_results: Vec<RankedResult> = probabilities
            .iter()
            .zip(CLASS_NAMES.iter().zip(CLASS_COLORS.iter()))
            .map(|(&probability, (&name, &color))| RankedResult {
                class_name: name.to_string(),
                probability,
                percentage: Self::format_percentage(probability),
                color: color.to_string(),
            })
            .collect();

        // sort_by 是稳定排序，概率相同的类别保持原有顺序
        all_results.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(Ordering::Equal)
        });

        Ok(ClassificationOutcome {
            predicted_class: CLASS_NAMES[max_idx].to_string(),
            confidence,
            confidence_percentage: Self::format_percentage(confidence),
            all_results,
        })
    }

    /// 概率转百分比文本，四舍五入（远离零）到两位小数
    pub fn format_percentage(probability: f32) -> String {
        let hundredths = (probability as f64 * 10_000.0).round() as i64;
        let sign = if hundredths < 0 { "-" } else { "" };
        let hundredths = hundredths.unsigned_abs();
        format!("{}{}.{:02}", sign, hundredths / 100, hundredths % 100)
    }

    /// 格式化为纯文本输出
    pub fn format_plain_text(outcome: &ClassificationOutcome) -> String {
        let mut text = format!(
            "Prediction: {} ({}%)\n",
            outcome.predicted_class, outcome.confidence_percentage
        );

        for result in &outcome.all_results {
            let _ = writeln!(text, "  {:<8} {:>6}%", result.class_name, result.percentage);
        }

        text
    }
}
