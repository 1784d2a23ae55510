//! ローカルイメージタグの命名規則

/// テスト用イメージタグの接頭辞
pub const TAG_PREFIX: &str = "cdkasset";

/// イメージタグを計算
///
/// `cdkasset-<assetId>[-<target>]` を小文字化したもの。
/// ターゲットが解決されなかった場合はサフィックスを付けない。
pub fn image_tag(asset_id: &str, target: Option<&str>) -> String {
    let tag = match target.filter(|target| !target.is_empty()) {
        Some(target) => format!("{}-{}-{}", TAG_PREFIX, asset_id, target),
        None => format!("{}-{}", TAG_PREFIX, asset_id),
    };
    tag.to_lowercase()
}
