//! 基于lopdf的PDF排版，使用PDF内置的Helvetica字体

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use markdown::ParseOptions;
use markdown::mdast::Node;

use super::DocumentExporter;
use crate::error::{PlannerError, PlannerResult};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const BODY_SIZE: i64 = 11;
const INDENT_STEP: i64 = 15;

/// 排版后的一行
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { depth: u8, text: String },
    Text { text: String, indent: i64 },
    Rule,
    Gap,
}

/// A4版面的PDF导出器，相同的输入产生完全相同的字节
#[derive(Debug, Default, Clone)]
pub struct PdfExporter;

impl PdfExporter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExporter for PdfExporter {
    fn export(&self, document: &str) -> PlannerResult<Vec<u8>> {
        let root = markdown::to_mdast(document, &ParseOptions::gfm())
            .map_err(|e| PlannerError::Render(e.to_string()))?;

        let mut blocks = Vec::new();
        collect_blocks(&root, 0, &mut blocks);

        let pages = layout(&blocks);
        build_pdf(pages)
    }
}

/// 将Markdown语法树展开为顺序排列的块
fn collect_blocks(node: &Node, indent: i64, blocks: &mut Vec<Block>) {
    match node {
        Node::Root(root) => {
            for child in &root.children {
                collect_blocks(child, indent, blocks);
            }
        }
        Node::Heading(heading) => {
            blocks.push(Block::Heading {
                depth: heading.depth,
                text: node.to_string(),
            });
        }
        Node::Paragraph(_) => {
            blocks.push(Block::Text {
                text: node.to_string(),
                indent,
            });
            blocks.push(Block::Gap);
        }
        Node::List(list) => {
            for (index, item) in list.children.iter().enumerate() {
                let marker = if list.ordered {
                    format!("{}.", list.start.unwrap_or(1) as usize + index)
                } else {
                    "-".to_string()
                };
                collect_list_item(item, &marker, indent, blocks);
            }
            if indent == 0 {
                blocks.push(Block::Gap);
            }
        }
        Node::Code(code) => {
            for line in code.value.lines() {
                blocks.push(Block::Text {
                    text: line.to_string(),
                    indent: indent + INDENT_STEP,
                });
            }
            blocks.push(Block::Gap);
        }
        Node::Blockquote(quote) => {
            for child in &quote.children {
                collect_blocks(child, indent + INDENT_STEP, blocks);
            }
        }
        Node::Table(table) => {
            for row in &table.children {
                let cells: Vec<String> = row
                    .children()
                    .map(|cells| cells.iter().map(|cell| cell.to_string()).collect())
                    .unwrap_or_default();
                blocks.push(Block::Text {
                    text: cells.join(" | "),
                    indent,
                });
            }
            blocks.push(Block::Gap);
        }
        Node::ThematicBreak(_) => blocks.push(Block::Rule),
        Node::Html(_) => {}
        other => {
            let text = other.to_string();
            if !text.trim().is_empty() {
                blocks.push(Block::Text { text, indent });
            }
        }
    }
}

fn collect_list_item(item: &Node, marker: &str, indent: i64, blocks: &mut Vec<Block>) {
    let Some(children) = item.children() else {
        return;
    };
    let mut marker = Some(marker);
    for child in children {
        match (child, marker.take()) {
            (Node::Paragraph(_), Some(marker)) => blocks.push(Block::Text {
                text: format!("{} {}", marker, child.to_string()),
                indent,
            }),
            (Node::Paragraph(_), None) => blocks.push(Block::Text {
                text: child.to_string(),
                indent: indent + INDENT_STEP,
            }),
            (other, _) => collect_blocks(other, indent + INDENT_STEP, blocks),
        }
    }
}

/// 字体名、字号与行高
fn font_of(block: &Block) -> (&'static str, i64, i64) {
    match block {
        Block::Heading { depth: 1, .. } => ("F2", 18, 26),
        Block::Heading { depth: 2, .. } => ("F2", 15, 22),
        Block::Heading { .. } => ("F2", 12, 18),
        _ => ("F1", BODY_SIZE, 15),
    }
}

/// 按字宽近似折行
fn wrap(text: &str, size: i64, width: i64) -> Vec<String> {
    let max_chars = ((width as f64) / (size as f64 * 0.5)).max(10.0) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::replace(&mut current, word));
        } else {
            current.push(' ');
            current.push_str(&word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// 将WinAnsi以外的字符替换为可显示的近似字符
fn sanitize(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '₹' => sanitized.push_str("INR "),
            '€' => sanitized.push_str("EUR "),
            '£' => sanitized.push_str("GBP "),
            '¥' => sanitized.push_str("JPY "),
            '–' | '—' | '−' => sanitized.push('-'),
            '‘' | '’' => sanitized.push('\''),
            '“' | '”' => sanitized.push('"'),
            '•' | '·' => sanitized.push('-'),
            '…' => sanitized.push_str("..."),
            '\t' => sanitized.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => sanitized.push(c),
            _ => sanitized.push('?'),
        }
    }
    sanitized
}

fn text_operations(font: &str, size: i64, x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// 分页排版，返回每页的绘制指令
fn layout(blocks: &[Block]) -> Vec<Vec<Operation>> {
    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut operations: Vec<Operation> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for block in blocks {
        let (font, size, leading) = font_of(block);
        match block {
            Block::Gap => {
                y -= leading / 2;
                continue;
            }
            Block::Rule => {
                if y - leading < MARGIN {
                    pages.push(std::mem::take(&mut operations));
                    y = PAGE_HEIGHT - MARGIN;
                }
                y -= leading / 2;
                operations.push(Operation::new("m", vec![Object::Integer(MARGIN), Object::Integer(y)]));
                operations.push(Operation::new(
                    "l",
                    vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
                ));
                operations.push(Operation::new("S", vec![]));
                y -= leading / 2;
                continue;
            }
            _ => {}
        }

        let (text, indent) = match block {
            Block::Heading { text, .. } => {
                y -= leading / 3;
                (text, 0)
            }
            Block::Text { text, indent } => (text, *indent),
            _ => continue,
        };

        let x = MARGIN + indent;
        for line in wrap(&sanitize(text), size, PAGE_WIDTH - MARGIN - x) {
            if y - leading < MARGIN {
                pages.push(std::mem::take(&mut operations));
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= leading;
            operations.extend(text_operations(font, size, x, y, &line));
        }
    }

    if !operations.is_empty() || pages.is_empty() {
        pages.push(operations);
    }
    pages
}

fn build_pdf(pages: Vec<Vec<Operation>>) -> PlannerResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| PlannerError::Render(format!("无法编码PDF内容: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
        "Count" => Object::Integer(page_ids.len() as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PlannerError::Render(format!("无法写出PDF: {}", e)))?;
    Ok(buffer)
}
