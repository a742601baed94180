use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Fixed tag catalog. A tag's id is its 1-based position in this list.
pub const TAG_NAMES: &[&str] = &[
    "ライブ配信", "ゲーム実況", "生放送", "アドバイス", "初心者歓迎", "プロゲーマー", "新作ゲーム", "レトロゲーム", "RPG", "FPS",
    "アクションゲーム", "対戦ゲーム", "マルチプレイ", "シングルプレイ", "ゲーム解説", "ホラーゲーム", "イベント生放送", "新情報発表",
    "Q&Aセッション", "チャット交流", "視聴者参加", "音楽ライブ", "カバーソング", "オリジナル楽曲", "アコースティック", "歌配信", "楽器演奏",
    "ギター", "ピアノ", "バンドセッション", "DJセット", "トーク配信", "朝活", "夜ふかし", "日常話", "趣味の話", "語学学習", "お料理配信",
    "手料理", "レシピ紹介", "アート配信", "絵描き", "DIY", "手芸", "アニメトーク", "映画レビュー", "読書感想", "ファッション", "メイク",
    "ビューティー", "健康", "ワークアウト", "ヨガ", "ダンス", "旅行記", "アウトドア", "キャンプ", "ペットと一緒", "猫", "犬", "釣り",
    "ガーデニング", "テクノロジー", "ガジェット紹介", "プログラミング", "DIY電子工作", "ニュース解説", "歴史", "文化", "社会問題", "心理学",
    "宇宙", "科学", "マジック", "コメディ", "スポーツ", "サッカー", "野球", "バスケットボール", "ライフハック", "教育", "子育て",
    "ビジネス", "起業", "投資", "仮想通貨", "株式投資", "不動産", "キャリア", "スピリチュアル", "占い", "手相", "オカルト", "UFO",
    "都市伝説", "コンサート", "ファンミーティング", "コラボ配信", "記念配信", "生誕祭", "周年記念", "サプライズ", "椅子",
];

pub fn tag_by_id(id: i64) -> Option<Tag> {
    let index = usize::try_from(id.checked_sub(1)?).ok()?;
    TAG_NAMES.get(index).map(|name| Tag {
        id,
        name: (*name).to_string(),
    })
}

pub fn tag_id_by_name(name: &str) -> Option<i64> {
    TAG_NAMES
        .iter()
        .position(|candidate| *candidate == name)
        .map(|index| index as i64 + 1)
}

/// Join tag ids into the denormalized `raw_tags` column.
pub fn encode_raw_tags(tag_ids: &[i64]) -> String {
    tag_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Resolve `raw_tags` back into catalog tags. Empty, malformed and unknown
/// ids are skipped.
pub fn decode_raw_tags(raw_tags: &str) -> Vec<Tag> {
    raw_tags
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .filter_map(tag_by_id)
        .collect()
}
