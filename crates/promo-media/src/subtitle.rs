//! Drawtext subtitle filters built from a video script.

use std::path::{Path, PathBuf};

use promo_models::VideoScript;

/// How long the hook caption stays on screen, in seconds.
const HOOK_DURATION: f64 = 3.0;

/// Find a system font that covers CJK text for drawtext.
pub fn find_subtitle_font() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
            "/Library/Fonts/Arial Unicode MS.ttf",
        ]
    } else if cfg!(target_os = "windows") {
        &["C:/Windows/Fonts/msyh.ttc", "C:/Windows/Fonts/simsun.ttc"]
    } else {
        &[
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
    };

    candidates
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Escape text for FFmpeg's drawtext filter. Single quotes become
/// typographic quotes since they cannot be escaped inside the quoted
/// text argument.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\u{2019}")
        .replace(':', "\\:")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

fn font_opt(font_path: Option<&Path>) -> String {
    match font_path {
        Some(path) => format!(":fontfile='{}'", path.display()),
        None => String::new(),
    }
}

/// Build the drawtext filter chain for a script.
///
/// The hook shows for the first three seconds, each scene caption for
/// its scripted duration, and the CTA from the end of the last scene
/// onward. Returns an empty list when the script has no caption text.
pub fn build_subtitle_filters(script: &VideoScript, font_path: Option<&Path>) -> Vec<String> {
    let mut filters = Vec::new();
    let font = font_opt(font_path);
    let mut current_time = 0.0;

    let hook = script.hook.trim();
    if !hook.is_empty() {
        filters.push(format!(
            "drawtext=text='{}':fontsize=38:fontcolor=white:bordercolor=black:borderw=2\
             :x=(w-text_w)/2:y=60{font}:enable='between(t,0,{HOOK_DURATION})'",
            escape_drawtext(hook)
        ));
        current_time = HOOK_DURATION;
    }

    for scene in &script.scenes {
        let text = scene.text.trim();
        if !text.is_empty() {
            let start = current_time;
            let end = current_time + scene.duration;
            filters.push(format!(
                "drawtext=text='{}':fontsize=42:fontcolor=white:bordercolor=black:borderw=2\
                 :x=(w-text_w)/2:y=h-90{font}:enable='between(t,{start:.1},{end:.1})'",
                escape_drawtext(text)
            ));
        }
        current_time += scene.duration;
    }

    let cta = script.cta.trim();
    if !cta.is_empty() {
        filters.push(format!(
            "drawtext=text='{}':fontsize=38:fontcolor=yellow:bordercolor=black:borderw=2\
             :x=(w-text_w)/2:y=h-90{font}:enable='gte(t,{current_time:.1})'",
            escape_drawtext(cta)
        ));
    }

    filters
}
