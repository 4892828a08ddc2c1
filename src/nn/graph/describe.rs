/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Connection 的摘要（summary）输出，类似 Keras 的 `model.summary()`
 *
 * ┌──────────┬──────────┬──────────┬──────────┬──────────┐
 * │ 层名称   │ 类型     │ 输入形状 │ 输出形状 │ 参数量   │
 * ├──────────┼──────────┼──────────┼──────────┼──────────┤
 * │ input-1  │ input    │ [2]      │ [2]      │ -        │
 * └──────────┴──────────┴──────────┴──────────┴──────────┘
 */

use std::fmt;

use super::Connection;
use crate::nn::layer::{Layer, Shape, TraitLayer};

const HEADERS: [&str; 5] = ["层名称", "类型", "输入形状", "输出形状", "参数量"];

impl Connection {
    /// 按执行顺序把每个层渲染成一行
    fn summary_rows(&self) -> Vec<[String; 5]> {
        self.layers()
            .map(|layer| {
                let inputs = layer
                    .input_shapes()
                    .iter()
                    .map(format_shape)
                    .collect::<Vec<_>>()
                    .join(", ");
                [
                    layer.name().to_string(),
                    layer.kind().kind_name().to_string(),
                    inputs,
                    format_shape(&layer.output_shape().cloned()),
                    format_count(layer),
                ]
            })
            .collect()
    }

    /// 返回摘要字符串（Unicode 文本表格）
    pub fn summary_string(&self) -> String {
        self.to_string()
    }

    /// 打印摘要
    pub fn summary(&self) {
        println!("{self}");
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.summary_rows();
        let mut widths = HEADERS.map(display_width);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }

        let border = |left: &str, mid: &str, right: &str| {
            let segments = widths.map(|w| "─".repeat(w + 2));
            format!("{left}{}{right}", segments.join(mid))
        };
        let line = |cells: &[&str]| {
            let padded = cells
                .iter()
                .zip(widths)
                .map(|(cell, w)| format!(" {cell}{} ", " ".repeat(w - display_width(cell))))
                .collect::<Vec<_>>();
            format!("│{}│", padded.join("│"))
        };

        writeln!(f, "{}", border("┌", "┬", "┐"))?;
        writeln!(f, "{}", line(&HEADERS))?;
        writeln!(f, "{}", border("├", "┼", "┤"))?;
        for row in &rows {
            writeln!(f, "{}", line(&row.each_ref().map(String::as_str)))?;
        }
        writeln!(f, "{}", border("└", "┴", "┘"))?;
        write!(
            f,
            "入口: {}  出口: {}  总参数量: {}",
            self.input_layers.len(),
            self.output_layers.len(),
            self.parameter_count()
        )
    }
}

fn format_shape(shape: &Option<Shape>) -> String {
    shape
        .as_ref()
        .map_or_else(|| "?".to_string(), |shape| format!("{shape:?}"))
}

fn format_count(layer: &Layer) -> String {
    if layer.kind().requires_input_shape() && !layer.is_initialized() {
        "未初始化".to_string()
    } else if layer.parameter_count() == 0 {
        "-".to_string()
    } else {
        layer.parameter_count().to_string()
    }
}

/// 终端显示宽度：中日韩字符按2计
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| if ('\u{2E80}'..='\u{9FFF}').contains(&c) || ('\u{FF00}'..='\u{FFEF}').contains(&c) { 2 } else { 1 })
        .sum()
}
