use std::env;
use std::fs;
use std::process::ExitCode;

use mu_typeset::{
    paginate_chapter_with_styles, parse_stylesheet, ChapterOptions, MonospaceMetrics, Page,
    Stylesheet, TextAlign, TypesetError, WordStyle,
};

#[derive(Clone, Debug)]
enum Json {
    Bool(bool),
    Int(i64),
    Str(String),
    Arr(Vec<Json>),
    Obj(Vec<(String, Json)>),
}

impl Json {
    fn render(&self, pretty: bool) -> String {
        let mut out = String::new();
        self.write_into(&mut out, pretty, 0);
        out
    }

    fn write_into(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            Json::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Json::Int(v) => out.push_str(&v.to_string()),
            Json::Str(v) => write_json_string(out, v),
            Json::Arr(items) => {
                out.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if pretty {
                        out.push('\n');
                        write_indent(out, depth + 1);
                    }
                    item.write_into(out, pretty, depth + 1);
                    if idx + 1 != items.len() {
                        out.push(',');
                    }
                }
                if pretty && !items.is_empty() {
                    out.push('\n');
                    write_indent(out, depth);
                }
                out.push(']');
            }
            Json::Obj(fields) => {
                out.push('{');
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if pretty {
                        out.push('\n');
                        write_indent(out, depth + 1);
                    }
                    write_json_string(out, key);
                    out.push(':');
                    if pretty {
                        out.push(' ');
                    }
                    value.write_into(out, pretty, depth + 1);
                    if idx + 1 != fields.len() {
                        out.push(',');
                    }
                }
                if pretty && !fields.is_empty() {
                    out.push('\n');
                    write_indent(out, depth);
                }
                out.push('}');
            }
        }
    }
}

fn write_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c <= '\u{1f}' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn field(key: &str, value: Json) -> (String, Json) {
    (key.to_string(), value)
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

struct Settings {
    path: String,
    css: Option<String>,
    metrics: MonospaceMetrics,
    options: ChapterOptions,
}

fn run(args: Vec<String>) -> Result<(), String> {
    let mut rest = args.into_iter().skip(1).collect::<Vec<_>>();
    let pretty = pop_flag(&mut rest, "--pretty");

    if rest.is_empty() || rest[0] == "--help" || rest[0] == "-h" {
        print_help();
        return Ok(());
    }

    let cmd = rest.remove(0);
    match cmd.as_str() {
        "paginate" => {
            let settings = parse_settings(rest, "paginate")?;
            let pages = paginate(&settings)?;
            let output = Json::Obj(vec![
                field("chapter", Json::Str(settings.path.clone())),
                field("width", Json::Int(settings.options.viewport_width as i64)),
                field("height", Json::Int(settings.options.viewport_height as i64)),
                field("page_count", Json::Int(pages.len() as i64)),
                field("pages", Json::Arr(pages.iter().map(page_json).collect())),
            ]);
            println!("{}", output.render(pretty));
        }
        "lines" => {
            let settings = parse_settings(rest, "lines")?;
            for page in paginate(&settings)? {
                for text in page.line_texts() {
                    println!("{}", text);
                }
                println!("--- page {} ---", page.page_number);
            }
        }
        _ => {
            return Err(format!(
                "unknown command '{}'; run `mu-typeset --help` for usage",
                cmd
            ));
        }
    }

    Ok(())
}

fn paginate(settings: &Settings) -> Result<Vec<Page>, String> {
    let html = fs::read_to_string(&settings.path)
        .map_err(|e| format!("cannot read '{}': {}", settings.path, e))?;
    let styles = match &settings.css {
        Some(path) => {
            let css = fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path, e))?;
            parse_stylesheet(&css).map_err(display_err)?
        }
        None => Stylesheet::new(),
    };
    paginate_chapter_with_styles(
        &html,
        &settings.metrics,
        &styles,
        settings.options.clone(),
    )
    .map_err(display_err)
}

fn parse_settings(mut args: Vec<String>, command: &str) -> Result<Settings, String> {
    let mut options = ChapterOptions::default();
    options.first_line_indent = pop_flag(&mut args, "--indent");
    if pop_flag(&mut args, "--no-paragraph-spacing") {
        options.extra_paragraph_spacing = false;
    }

    let mut metrics = MonospaceMetrics::default();
    let mut css = None;
    let mut positional = Vec::new();
    let mut i = 0usize;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--width" | "--height" | "--char-width" | "--line-height" | "--css" | "--align" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} requires a value", arg))?;
                match arg {
                    "--width" => options.viewport_width = parse_px(arg, value)?,
                    "--height" => options.viewport_height = parse_px(arg, value)?,
                    "--char-width" => {
                        let width = parse_px(arg, value)?;
                        metrics = metrics.with_bold_char_width(width);
                        metrics.char_width = width;
                    }
                    "--line-height" => {
                        metrics.line_height = parse_px(arg, value)?;
                        metrics.ascender = metrics.line_height * 4 / 5;
                    }
                    "--css" => css = Some(value.clone()),
                    _ => options.paragraph_alignment = parse_align(value)?,
                }
                i += 2;
            }
            _ => {
                positional.push(args[i].clone());
                i += 1;
            }
        }
    }

    let path = first_arg(&positional, &format!("{} requires <chapter_path>", command))?;
    Ok(Settings {
        path,
        css,
        metrics,
        options,
    })
}

fn parse_px(flag: &str, value: &str) -> Result<i32, String> {
    match value.parse::<i32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(format!("invalid {} value '{}'", flag, value)),
    }
}

fn parse_align(value: &str) -> Result<TextAlign, String> {
    match value {
        "left" => Ok(TextAlign::Left),
        "center" => Ok(TextAlign::Center),
        "right" => Ok(TextAlign::Right),
        "justify" => Ok(TextAlign::Justify),
        _ => Err(format!("invalid --align value '{}'", value)),
    }
}

fn first_arg(args: &[String], msg: &str) -> Result<String, String> {
    args.first().cloned().ok_or_else(|| msg.to_string())
}

fn pop_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn style_json(style: WordStyle) -> Json {
    Json::Obj(vec![
        field("bold", Json::Bool(style.is_bold())),
        field("italic", Json::Bool(style.is_italic())),
        field("underline", Json::Bool(style.is_underline())),
    ])
}

fn page_json(page: &Page) -> Json {
    let lines = page
        .lines
        .iter()
        .map(|placed| {
            let words = placed
                .line
                .words
                .iter()
                .map(|word| {
                    Json::Obj(vec![
                        field("text", Json::Str(word.text.clone())),
                        field("x", Json::Int(word.x as i64)),
                        field("style", style_json(word.style)),
                    ])
                })
                .collect();
            Json::Obj(vec![
                field("x", Json::Int(placed.x as i64)),
                field("y", Json::Int(placed.y as i64)),
                field("text", Json::Str(placed.line.text())),
                field("words", Json::Arr(words)),
            ])
        })
        .collect();
    Json::Obj(vec![
        field("page", Json::Int(page.page_number as i64)),
        field("line_count", Json::Int(page.line_count() as i64)),
        field("lines", Json::Arr(lines)),
    ])
}

fn display_err(err: TypesetError) -> String {
    err.to_string()
}

fn print_help() {
    let help = r#"mu-typeset - paginate XHTML chapters

USAGE:
  mu-typeset [--pretty] <command> <chapter_path> [options...]

COMMANDS:
  paginate <chapter_path>    positioned words per page, as JSON
  lines <chapter_path>       plain text lines with page separators

OPTIONS:
  --width <px>               viewport width (default 416)
  --height <px>              viewport height (default 715)
  --char-width <px>          monospace advance (default 10)
  --line-height <px>         line advance (default 26)
  --css <path>               stylesheet applied to the chapter
  --align <left|center|right|justify>
  --indent                   indent first lines of paragraphs
  --no-paragraph-spacing     no half-line gap between paragraphs
"#;
    println!("{}", help);
}
