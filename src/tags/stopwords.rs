use std::collections::HashSet;

/// Japanese function words and fragments that never make useful tags:
/// particles, conjunctions, adverbs, auxiliary and adjective inflections,
/// demonstratives, affixes, interjections, interrogatives, punctuation and
/// counters.
pub const JAPANESE_STOP_WORDS: &[&str] = &[
    // particles
    "は", "が", "を", "に", "で", "と", "の", "へ", "から", "まで", "より", "や", "か", "も",
    "こそ", "さえ", "しか", "だけ", "ばかり", "など", "なり", "やら", "きり", "っきり",
    // conjunctions
    "そして", "それで", "しかし", "でも", "だが", "ところが", "けれど", "けれども", "なのに",
    "だから", "そこで", "すると", "それなら", "また", "さらに", "つまり", "すなわち", "たとえば",
    "ただし", "もし", "もしも",
    // adverbs
    "とても", "すごく", "かなり", "ちょっと", "少し", "もう", "まだ", "すでに", "いつも", "たまに",
    "よく", "あまり", "ぜんぜん", "きっと", "たぶん", "もしかして",
    // auxiliary verb inflections
    "です", "である", "ます", "した", "して", "される", "られる", "せる", "させる", "れる", "られ",
    "ない", "なく", "ぬ", "ん",
    // adjective inflections
    "なし", "い", "く", "かっ", "け", "さ",
    // demonstratives
    "これ", "それ", "あれ", "どれ", "この", "その", "あの", "どの", "ここ", "そこ", "あそこ",
    "どこ", "こちら", "そちら", "あちら", "どちら",
    // affixes
    "お", "ご", "み", "さん", "ちゃん", "くん", "様", "さま", "たち", "ども",
    // interjections
    "あ", "う", "え", "はい", "いいえ", "うん", "ううん", "ええ", "へえ", "ほお", "まあ", "おお",
    "わあ",
    // interrogatives
    "何", "なに", "なん", "いつ", "どう", "なぜ", "どうして", "いくら", "いくつ", "どんな",
    // punctuation and marks
    "、", "。", "！", "？", "…", "・", "※", "＊", "×", "○", "△", "□", "◇", "☆", "★",
    // time and counters
    "時", "分", "秒", "年", "月", "日", "週", "回", "個", "本", "枚", "台", "人", "名", "件", "点",
];

/// Closed set of words excluded from tag candidates. Matching is
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(JAPANESE_STOP_WORDS.iter().copied())
    }
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::empty().with_extra(words)
    }

    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    pub fn with_extra<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(|word| word.as_ref().trim().to_lowercase())
                .filter(|word| !word.is_empty()),
        );
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
