use serde::Serialize;

use crate::domain::{Category, Page};

/// Text of one page, lines joined by newline, paired with its page
/// number. Built independently of any prompt so it can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub context: String,
    pub page_number: u32,
}

pub fn page_contexts(pages: &[Page]) -> Vec<PageContext> {
    pages
        .iter()
        .map(|page| PageContext {
            context: page
                .lines
                .iter()
                .map(|line| line.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            page_number: page.page_number,
        })
        .collect()
}

/// System prompt for the classification call. The caller-supplied
/// instruction is embedded verbatim; the surrounding template fixes the
/// reasoning rules and the output schema description.
pub fn classification_system_prompt(classification_instruction: &str) -> String {
    format!(
        r#"あなたは与えられた業務ドキュメントを分析し、ドキュメントの内容を考慮して構造的な文書にする役割です。

# 指示
ドキュメント内容を情報のまとまりで分類分けしてください。
分類に紐づくドキュメントのページ番号を出力してください。

# ユーザメッセージで与えられるデータの説明
- 「-------------------- Markdown --------------------」は、ドキュメント全体をMarkdownで表現したものです。
- 「-------------------- pages --------------------」は、ページごとの情報を表しています。

# ルール
- 「-------------------- Markdown --------------------」の内容を元に、ドキュメント全体の構造を理解して分類名を生成してください。
- 「-------------------- pages --------------------」のJson情報を元に、page_numberを提示してください。
    - 「# ページ番号」と「## ページ内容」が与えられます。
    - 与えられた「# ページ番号」以外のページ番号は出力してはいけません。
    - page_numberは分類ごとに被っても構いません。
- 「ユーザから指示された分類」は必ず含むようにしてください。
- 分類の追加は自由です。

# ユーザから指示された分類
{classification_instruction}

# 出力形式
- category: 分類の各項目名
- page_number: 分類に紐づくページ番号

# 出力形式例
{{
    [
        {{
            "category": "目次の各項目名",
            "page_numbers": [
                1, 2
            ]
        }}
    ]
}}"#
    )
}

/// User prompt for the classification call: the whole-document markdown
/// followed by one block per page listing its text lines, in page order.
pub fn classification_user_prompt(content_markdown: &str, pages: &[Page]) -> String {
    let pages_markdown = pages
        .iter()
        .map(|page| {
            let lines = page
                .lines
                .iter()
                .map(|line| line.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            format!("# ページ番号: {}\n## ページ内容:\n{}", page.page_number, lines)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "-------------------- Markdown --------------------\n{content_markdown}\n\n-------------------- pages --------------------\n{pages_markdown}"
    )
}

/// System prompt for the extraction call: the full category list, the
/// whole-document markdown, and the per-page contexts, each under its
/// own labeled section.
pub fn extraction_system_prompt(
    categories: &[Category],
    content_markdown: &str,
    contexts: &[PageContext],
) -> Result<String, serde_json::Error> {
    let categories_json = serde_json::to_string(categories)?;
    let contexts_json = serde_json::to_string(contexts)?;

    Ok(format!(
        r#"あなたは業務ドキュメントをから必要な情報を抽出する役割です。
ユーザーメッセージで抽出するべき内容の題名（抽出対象分類名）が与えられます。
ドキュメントの内容から抽出対象分類名に該当する情報を漏れなく抽出してください。

◆ 補足情報の解説
- 「------ 全分類 ------」は、ドキュメント全体の分類名です。
- 「------ Markdown -------」は、ドキュメント全体の内容をMarkdownで表現したものです。
- 「------ pages -------」は、ページごとの情報を表しています。

◆ 実データ

------ 全分類 ------
{categories_json}


------ Markdown -------
{content_markdown}


------ pages -------
{contexts_json}"#
    ))
}

/// User prompt for the extraction call: the target category itself.
pub fn extraction_user_prompt(target_category: &Category) -> Result<String, serde_json::Error> {
    serde_json::to_string(target_category)
}

/// HTML-escapes markdown before it is sent back to clients: `&`, `<`,
/// `>`, and `"` become entities. A standard HTML unescape reproduces
/// the original text.
pub fn escape_markdown(content_markdown: &str) -> String {
    html_escape::encode_double_quoted_attribute(content_markdown).into_owned()
}
