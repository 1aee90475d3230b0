// ==========================================
// 商品导入暂存系统 - 表头规范化与相似度
// ==========================================
// 职责: 纯函数（无持久化、无请求上下文）
// - 表头规范化: 小写 / 去变音符 / 分隔符折叠 / 分词
// - 相似度: 精确 / 词边界包含 / 词集 Jaccard / 编辑距离
// ==========================================

/// 去除变音符（波兰语、德语、法语常见字符）
pub fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'ą' | 'ä' | 'à' | 'â' | 'á' => out.push('a'),
            'Ą' | 'Ä' | 'À' | 'Â' | 'Á' => out.push('A'),
            'ć' | 'ç' | 'č' => out.push('c'),
            'Ć' | 'Ç' | 'Č' => out.push('C'),
            'ę' | 'é' | 'è' | 'ê' | 'ë' | 'ě' => out.push('e'),
            'Ę' | 'É' | 'È' | 'Ê' | 'Ë' | 'Ě' => out.push('E'),
            'î' | 'ï' | 'í' => out.push('i'),
            'Î' | 'Ï' | 'Í' => out.push('I'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'ń' | 'ň' => out.push('n'),
            'Ń' | 'Ň' => out.push('N'),
            'ó' | 'ö' | 'ô' | 'ò' => out.push('o'),
            'Ó' | 'Ö' | 'Ô' | 'Ò' => out.push('O'),
            'ś' | 'š' => out.push('s'),
            'Ś' | 'Š' => out.push('S'),
            'ü' | 'û' | 'ù' | 'ú' | 'ů' => out.push('u'),
            'Ü' | 'Û' | 'Ù' | 'Ú' | 'Ů' => out.push('U'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'Ź' | 'Ż' | 'Ž' => out.push('Z'),
            'ß' => out.push_str("ss"),
            other => out.push(other),
        }
    }
    out
}

/// 规范化表头
///
/// "  Cena_Netto (PLN) " → "cena netto pln"
pub fn normalize_header(raw: &str) -> String {
    let folded = fold_diacritics(&raw.trim().to_lowercase());
    tokenize(&folded).join(" ")
}

/// 分词: 非字母数字字符均视为分隔
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// 编辑距离（按字符）
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// 词边界包含（"cena" ⊂ "cena netto"，但 "h" ⊄ "short"）
fn contains_on_token_boundary(longer: &str, shorter: &str) -> bool {
    let padded_longer = format!(" {} ", longer);
    let padded_shorter = format!(" {} ", shorter);
    padded_longer.contains(&padded_shorter)
}

fn jaccard(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.iter().filter(|t| b.contains(t)).count();
    let mut union: Vec<&String> = a.iter().collect();
    for t in b {
        if !a.contains(t) {
            union.push(t);
        }
    }
    intersection as f64 / union.len() as f64
}

/// 两个已规范化字符串的相似度 ∈ [0, 1]
///
/// - 完全相同: 1.0
/// - 词边界包含: 0.8 + 0.2 · 短/长
/// - 其他: max(词集 Jaccard · 0.9, 1 − 编辑距离/最大长度)
pub fn similarity(header: &str, alias: &str) -> f64 {
    if header.is_empty() || alias.is_empty() {
        return 0.0;
    }
    if header == alias {
        return 1.0;
    }

    let header_len = header.chars().count();
    let alias_len = alias.chars().count();
    let (longer, shorter, long_len, short_len) = if header_len >= alias_len {
        (header, alias, header_len, alias_len)
    } else {
        (alias, header, alias_len, header_len)
    };
    if contains_on_token_boundary(longer, shorter) {
        return 0.8 + (short_len as f64 / long_len as f64) * 0.2;
    }

    let overlap = jaccard(&tokenize(header), &tokenize(alias)) * 0.9;
    let edit = 1.0 - levenshtein(header, alias) as f64 / long_len as f64;
    overlap.max(edit).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Cena_Netto (PLN) "), "cena netto pln");
        assert_eq!(normalize_header("Wysokość"), "wysokosc");
        assert_eq!(normalize_header("Größe"), "grosse");
        assert_eq!(normalize_header("Ilość  szt."), "ilosc szt");
        assert_eq!(normalize_header("---"), "");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("waga", "waga"), 0);
    }

    #[test]
    fn test_similarity_rules() {
        assert_eq!(similarity("sku", "sku"), 1.0);

        let contained = similarity("cena netto", "cena");
        assert!((contained - (0.8 + 0.4 * 0.2)).abs() < 1e-9);

        // 单字母别名不会命中任意含该字母的表头
        assert!(similarity("short description", "h") < 0.5);

        // 拼写错误由编辑距离兜底
        assert!(similarity("manufacturr", "manufacturer") > 0.9);

        assert!(similarity("foo", "") == 0.0);
    }
}
