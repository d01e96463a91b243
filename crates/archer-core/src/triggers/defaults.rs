//! The application's standard bilingual trigger set.
//!
//! Actions are deliberately not attached here. Embedders take these
//! definitions, attach their own [`TriggerAction`](super::TriggerAction)
//! implementations per kind, and build the registry.

use super::matcher::KeywordSet;
use super::registry::TriggerRegistry;
use super::types::{KeywordTrigger, TriggerCategory};

/// Kind of the web search intention trigger.
pub const WEB_SEARCH_KIND: &str = "intention.web_search";
/// Kind of the image generation intention trigger.
pub const IMAGE_GEN_KIND: &str = "intention.image_gen";
/// Kind of the general memory extraction trigger.
pub const MEMORY_GENERAL_KIND: &str = "memory.general";
/// Kind of the memory recall trigger.
pub const MEMORY_RECALL_KIND: &str = "memory.recall";

fn kw(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// The standard trigger definitions, action-less, in dispatch order.
pub fn default_triggers() -> Vec<KeywordTrigger> {
    vec![
        KeywordTrigger::new(
            WEB_SEARCH_KIND,
            TriggerCategory::Intention,
            KeywordSet::new(
                kw(&[
                    "search for",
                    "search the web",
                    "look up",
                    "google",
                    "find out",
                    "latest news",
                    "current news",
                    "what's the weather",
                    "weather today",
                    "weather tomorrow",
                    "stock price",
                ]),
                kw(&[
                    "搜索",
                    "搜一下",
                    "查一下",
                    "查查",
                    "上网查",
                    "最新消息",
                    "新闻",
                    "今天天气",
                    "明天天气",
                    "股价",
                ]),
            ),
        )
        .with_description("User asks for information from the live web"),
        KeywordTrigger::new(
            IMAGE_GEN_KIND,
            TriggerCategory::Intention,
            KeywordSet::new(
                kw(&[
                    "draw me",
                    "draw a",
                    "draw an",
                    "generate an image",
                    "generate a picture",
                    "create an image",
                    "make a picture",
                    "paint a",
                ]),
                kw(&["画一个", "画个", "画张", "生成图片", "生成一张", "画一幅"]),
            ),
        )
        .with_description("User asks for a generated image"),
        KeywordTrigger::new(
            MEMORY_GENERAL_KIND,
            TriggerCategory::Memory,
            KeywordSet::new(
                kw(&[
                    "remember that",
                    "remember this",
                    "remember me",
                    "don't forget",
                    "i prefer",
                    "i like",
                    "i love",
                    "i hate",
                    "i'm allergic",
                    "my favorite",
                    "my favourite",
                    "my birthday",
                    "call me",
                ]),
                kw(&[
                    "记住",
                    "记一下",
                    "别忘了",
                    "我喜欢",
                    "我爱",
                    "我讨厌",
                    "我过敏",
                    "我的生日",
                    "叫我",
                ]),
            ),
        )
        .with_description("Message states a preference or fact worth keeping"),
        KeywordTrigger::new(
            MEMORY_RECALL_KIND,
            TriggerCategory::Memory,
            KeywordSet::new(
                kw(&[
                    "do you remember",
                    "what did i say",
                    "what did i tell you",
                    "what do you know about me",
                    "last time",
                ]),
                kw(&["你还记得", "我说过", "我告诉过你", "你知道我", "上次"]),
            ),
        )
        .with_description("User asks the assistant to recall stored facts"),
    ]
}

/// A frozen registry of the standard triggers, still action-less.
pub fn default_registry() -> TriggerRegistry {
    default_triggers()
        .into_iter()
        .fold(TriggerRegistry::builder(), |b, t| b.register(t))
        .build()
}
