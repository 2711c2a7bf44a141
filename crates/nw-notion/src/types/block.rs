//! Content blocks.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::rich_text::{RichText, plain_text};
use crate::EntityId;

/// A content block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block id. For `child_page` and `child_database` blocks this is the id
    /// of the nested page or database.
    pub id: EntityId,
    /// Whether the block has nested blocks of its own.
    pub has_children: bool,
    /// Typed block body.
    pub kind: BlockKind,
}

/// Block body, one variant per recognized `type` tag.
///
/// Text is kept as concatenated plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph {
        text: String,
    },
    Heading {
        /// 1 to 3.
        level: u8,
        text: String,
    },
    BulletedListItem {
        text: String,
    },
    NumberedListItem {
        text: String,
    },
    Quote {
        text: String,
    },
    Code {
        language: String,
        text: String,
    },
    Divider,
    Image {
        url: String,
        caption: String,
    },
    Callout {
        emoji: String,
        text: String,
    },
    Bookmark {
        url: String,
        caption: String,
    },
    File {
        url: String,
        caption: String,
    },
    Equation {
        expression: String,
    },
    ChildPage {
        title: String,
    },
    ChildDatabase {
        title: String,
    },
    /// Any other tag, or a recognized tag whose body could not be read.
    Unsupported {
        block_type: String,
    },
}

#[derive(Deserialize)]
struct RawBlock {
    id: EntityId,
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Deserialize)]
struct TextBody {
    #[serde(default)]
    rich_text: Vec<RichText>,
}

#[derive(Deserialize)]
struct CodeBody {
    #[serde(default)]
    rich_text: Vec<RichText>,
    #[serde(default)]
    language: String,
}

#[derive(Deserialize, Default)]
struct Hosted {
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct MediaBody {
    #[serde(default)]
    file: Option<Hosted>,
    #[serde(default)]
    external: Option<Hosted>,
    #[serde(default)]
    caption: Vec<RichText>,
}

impl MediaBody {
    /// Hosted file URL, falling back to the external URL.
    fn url(&self) -> String {
        [&self.file, &self.external]
            .into_iter()
            .flatten()
            .map(|hosted| hosted.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_owned()
    }
}

#[derive(Deserialize)]
struct Icon {
    #[serde(default)]
    emoji: String,
}

#[derive(Deserialize)]
struct CalloutBody {
    #[serde(default)]
    rich_text: Vec<RichText>,
    #[serde(default)]
    icon: Option<Icon>,
}

#[derive(Deserialize)]
struct BookmarkBody {
    #[serde(default)]
    url: String,
    #[serde(default)]
    caption: Vec<RichText>,
}

#[derive(Deserialize)]
struct EquationBody {
    #[serde(default)]
    expression: String,
}

#[derive(Deserialize)]
struct ChildBody {
    #[serde(default)]
    title: String,
}

impl BlockKind {
    fn from_body(block_type: &str, body: Option<&Value>) -> Self {
        let parsed = body.and_then(|body| Self::parse(block_type, body));
        parsed.unwrap_or_else(|| Self::Unsupported {
            block_type: block_type.to_owned(),
        })
    }

    fn parse(block_type: &str, body: &Value) -> Option<Self> {
        fn text(body: &Value) -> Option<String> {
            TextBody::deserialize(body)
                .ok()
                .map(|b| plain_text(&b.rich_text))
        }

        let kind = match block_type {
            "paragraph" => Self::Paragraph { text: text(body)? },
            "heading_1" | "heading_2" | "heading_3" => Self::Heading {
                level: block_type.as_bytes()[8] - b'0',
                text: text(body)?,
            },
            "bulleted_list_item" => Self::BulletedListItem { text: text(body)? },
            "numbered_list_item" => Self::NumberedListItem { text: text(body)? },
            "quote" => Self::Quote { text: text(body)? },
            "code" => {
                let code = CodeBody::deserialize(body).ok()?;
                Self::Code {
                    language: code.language,
                    text: plain_text(&code.rich_text),
                }
            }
            "divider" => Self::Divider,
            "image" | "file" => {
                let media = MediaBody::deserialize(body).ok()?;
                let url = media.url();
                let caption = plain_text(&media.caption);
                if block_type == "image" {
                    Self::Image { url, caption }
                } else {
                    Self::File { url, caption }
                }
            }
            "callout" => {
                let callout = CalloutBody::deserialize(body).ok()?;
                Self::Callout {
                    emoji: callout.icon.map(|icon| icon.emoji).unwrap_or_default(),
                    text: plain_text(&callout.rich_text),
                }
            }
            "bookmark" => {
                let bookmark = BookmarkBody::deserialize(body).ok()?;
                Self::Bookmark {
                    url: bookmark.url,
                    caption: plain_text(&bookmark.caption),
                }
            }
            "equation" => Self::Equation {
                expression: EquationBody::deserialize(body).ok()?.expression,
            },
            "child_page" => Self::ChildPage {
                title: ChildBody::deserialize(body).ok()?.title,
            },
            "child_database" => Self::ChildDatabase {
                title: ChildBody::deserialize(body).ok()?.title,
            },
            _ => return None,
        };
        Some(kind)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBlock::deserialize(deserializer)?;
        let kind = BlockKind::from_body(&raw.block_type, raw.rest.get(&raw.block_type));
        Ok(Self {
            id: raw.id,
            has_children: raw.has_children,
            kind,
        })
    }
}
