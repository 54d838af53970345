use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use kwlens_analysis::analyzer::Section;
use std::path::PathBuf;

/// 关键词占比与检索量分析
#[derive(Parser, Debug)]
#[command(name = "kwlens", version, about, long_about = None)]
pub struct Cli {
    /// 要分析的关键词
    pub keyword: String,

    /// 配置文件路径 (TOML/YAML/JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出的报告部分，可用逗号分隔多个
    #[arg(short, long, value_enum, value_delimiter = ',', default_value = "all")]
    pub section: Vec<SectionArg>,

    /// 绝对量换算的基准月份 (YYYY-MM 或 YYYY-MM-DD)，默认取倒数第二个月
    #[arg(long, value_parser = parse_period)]
    pub reference_period: Option<String>,

    /// 按天滚动的日志文件目录
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// 格式化输出 JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionArg {
    All,
    Gender,
    Age,
    Device,
    Trend,
    Volume,
    Related,
}

impl Cli {
    /// 展开为去重后的报告部分列表。
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        for arg in &self.section {
            let expanded: &[Section] = match arg {
                SectionArg::All => &Section::ALL,
                SectionArg::Gender => &[Section::Gender],
                SectionArg::Age => &[Section::Age],
                SectionArg::Device => &[Section::Device],
                SectionArg::Trend => &[Section::Trend],
                SectionArg::Volume => &[Section::Volume],
                SectionArg::Related => &[Section::Related],
            };
            for section in expanded {
                if !sections.contains(section) {
                    sections.push(*section);
                }
            }
        }
        sections
    }
}

/// 规整为 `YYYY-MM`，与 `YYYY-MM-01` 形式的月度标签按前缀匹配。
fn parse_period(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| format!("expected YYYY-MM, got '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_all_sections() {
        let cli = Cli::try_parse_from(["kwlens", "coffee"]).unwrap();
        assert_eq!(cli.keyword, "coffee");
        assert_eq!(cli.sections(), Section::ALL.to_vec());
        assert!(!cli.pretty);
    }

    #[test]
    fn test_section_list_and_period() {
        let cli = Cli::try_parse_from([
            "kwlens",
            "coffee",
            "--section",
            "volume,trend,volume",
            "--reference-period",
            "2025-01",
        ])
        .unwrap();
        assert_eq!(cli.sections(), vec![Section::Volume, Section::Trend]);
        assert_eq!(cli.reference_period.as_deref(), Some("2025-01"));
    }

    #[test]
    fn test_accepts_dated_period() {
        let cli = Cli::try_parse_from(["kwlens", "coffee", "--reference-period", "2024-12-01"]).unwrap();
        assert_eq!(cli.reference_period.as_deref(), Some("2024-12"));
    }

    #[test]
    fn test_rejects_bad_period() {
        assert!(Cli::try_parse_from(["kwlens", "coffee", "--reference-period", "2025-13"]).is_err());
        assert!(Cli::try_parse_from(["kwlens", "coffee", "--section", "weather"]).is_err());
    }
}
