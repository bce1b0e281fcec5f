// Terminal presentation - markdown rendering of uploads, results and banners

use crate::analysis::{AnalysisResult, ImageHandle, Outcome, TurnError, TurnReport};
use crossterm::style::Stylize;
use termimad::{MadSkin, crossterm::style::Color};

pub struct Presenter {
    skin: MadSkin,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            skin: create_markdown_skin(),
        }
    }

    pub fn print_banner(&self, model: &str) {
        self.skin.print_text("# 📷 Image Analyzer\n*Analyze multiple images using AI*");
        println!("Model: {}\n", model);
    }

    pub fn print_uploads(&self, images: &[ImageHandle]) {
        self.skin.print_text(&format_uploads(images));
    }

    pub fn print_processing(&self, count: usize) {
        println!("⏳ Processing {} image(s)...", count);
    }

    pub fn print_report(&self, report: &TurnReport, results: &[AnalysisResult]) {
        let headline = report_headline(report);
        let headline = if report.is_complete() {
            headline.green()
        } else if report.failed == report.images {
            headline.red()
        } else {
            headline.yellow()
        };
        println!(
            "{} ({} image(s) in {:.1}s, {})",
            headline,
            report.images,
            report.elapsed.as_secs_f32(),
            report.completed_at.format("%H:%M:%S")
        );
        println!();
        self.skin.print_text(&format_results(results));
    }

    pub fn print_turn_error(&self, error: &TurnError) {
        if error.is_warning() {
            self.warn(&error.to_string());
        } else {
            eprintln!("{}", format!("❌ {}", error).red());
        }
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{}", format!("⚠️  {}", message).yellow());
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();

    skin.headers[0].set_fg(Color::Cyan);
    skin.headers[1].set_fg(Color::Blue);
    skin.headers[2].set_fg(Color::Green);

    skin.code_block.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Yellow);

    skin.bold.set_fg(Color::White);
    skin.italic.set_fg(Color::Magenta);

    skin
}

/// One-line verdict for a batch that ran to the end
pub fn report_headline(report: &TurnReport) -> String {
    if report.is_complete() {
        "✅ Analysis Complete!".to_string()
    } else if report.failed == report.images {
        "❌ Analysis failed for every image".to_string()
    } else {
        let (failed, images) = (report.failed, report.images);
        format!("⚠️  Analysis finished with {failed} of {images} image(s) failed")
    }
}

/// Markdown listing of the images currently in the session
pub fn format_uploads(images: &[ImageHandle]) -> String {
    if images.is_empty() {
        return "*No images uploaded.*\n".to_string();
    }

    let mut out = String::from("### 🖼 Uploaded Image(s):\n\n");
    for image in images {
        out.push_str(&format!("* 📌 {} ({}x{})\n", image.filename, image.width, image.height));
    }
    out
}

/// Markdown section per image, in result order
pub fn format_results(results: &[AnalysisResult]) -> String {
    let mut out = String::new();

    for result in results {
        match &result.outcome {
            Outcome::Success(text) => {
                out.push_str(&format!("### 🔎 AI Response for {}:\n\n", result.filename));
                out.push_str(text.trim_end());
                out.push_str("\n\n");
            }
            Outcome::Failure(message) => {
                out.push_str(&format!("### ❌ {} failed\n\n", result.filename));
                out.push_str(&format!("`{}`\n\n", message));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ImageKind;
    use std::time::Duration;

    fn report(images: usize, failed: usize) -> TurnReport {
        TurnReport {
            images,
            failed,
            prompt: "x".to_string(),
            completed_at: chrono::Local::now(),
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_headline_reflects_failures() {
        assert_eq!(report_headline(&report(2, 0)), "✅ Analysis Complete!");
        assert!(report_headline(&report(3, 1)).contains("1 of 3 image(s) failed"));
        assert!(report_headline(&report(2, 2)).starts_with("❌"));
    }

    #[test]
    fn test_results_rendered_in_order() {
        let results = vec![
            AnalysisResult::success(0, "a.png", "First\n".to_string()),
            AnalysisResult::failed(1, "b.png", "quota".to_string()),
            AnalysisResult::success(2, "c.png", "Third".to_string()),
        ];
        let text = format_results(&results);

        let a = text.find("AI Response for a.png").unwrap();
        let b = text.find("b.png failed").unwrap();
        let c = text.find("AI Response for c.png").unwrap();
        assert!(a < b && b < c);
        assert!(text.contains("`quota`"));
    }

    #[test]
    fn test_uploads_listing() {
        assert!(format_uploads(&[]).contains("No images"));

        let images = vec![ImageHandle::new("cat.jpg", ImageKind::Jpeg, 640, 480, vec![0u8])];
        assert!(format_uploads(&images).contains("📌 cat.jpg (640x480)"));
    }
}
