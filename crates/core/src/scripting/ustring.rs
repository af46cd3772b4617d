//! `mw.ustring`: code point aware string functions.
//!
//! Indices follow Lua conventions (1-based, negative values count from the
//! end) but address code points instead of bytes.

use mlua::{Function, Lua, Result as LuaResult, String as LuaString, Table, Variadic};
use unicode_normalization::UnicodeNormalization;

/// Build the `mw.ustring` table.
pub fn create_ustring_table(lua: &Lua) -> LuaResult<Table> {
    let t = lua.create_table()?;

    t.set("isutf8", create_isutf8_fn(lua)?)?;
    t.set("len", create_len_fn(lua)?)?;
    t.set("sub", create_sub_fn(lua)?)?;
    t.set("codepoint", create_codepoint_fn(lua)?)?;
    t.set("char", create_char_fn(lua)?)?;

    let forms: [(&'static str, fn(&str) -> String); 6] = [
        ("upper", str::to_uppercase),
        ("lower", str::to_lowercase),
        ("toNFC", |s| s.nfc().collect()),
        ("toNFD", |s| s.nfd().collect()),
        ("toNFKC", |s| s.nfkc().collect()),
        ("toNFKD", |s| s.nfkd().collect()),
    ];
    for (name, transform) in forms {
        let f = lua.create_function(move |_, s: LuaString| Ok(transform(&utf8(&s, name)?)))?;
        t.set(name, f)?;
    }

    Ok(t)
}

/// `mw.ustring.isutf8(s)`
fn create_isutf8_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, s: LuaString| Ok(std::str::from_utf8(&s.as_bytes()).is_ok()))
}

/// `mw.ustring.len(s)`; `nil` for invalid UTF-8.
fn create_len_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, s: LuaString| {
        Ok(std::str::from_utf8(&s.as_bytes()).ok().map(|v| v.chars().count() as i64))
    })
}

/// `mw.ustring.sub(s, i?, j?)`
fn create_sub_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, (s, i, j): (LuaString, Option<i64>, Option<i64>)| {
        let chars: Vec<char> = utf8(&s, "sub")?.chars().collect();
        Ok(match char_range(chars.len(), i.unwrap_or(1), j.unwrap_or(-1)) {
            Some((start, end)) => chars[start..end].iter().collect(),
            None => String::new(),
        })
    })
}

/// `mw.ustring.codepoint(s, i?, j?)`
fn create_codepoint_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, (s, i, j): (LuaString, Option<i64>, Option<i64>)| {
        let chars: Vec<char> = utf8(&s, "codepoint")?.chars().collect();
        let i = i.unwrap_or(1);
        let out: Variadic<i64> = match char_range(chars.len(), i, j.unwrap_or(i)) {
            Some((start, end)) => {
                chars[start..end].iter().map(|c| i64::from(u32::from(*c))).collect()
            }
            None => Variadic::new(),
        };
        Ok(out)
    })
}

/// `mw.ustring.char(...)`
fn create_char_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|_, codepoints: Variadic<i64>| {
        codepoints
            .iter()
            .enumerate()
            .map(|(n, cp)| {
                u32::try_from(*cp).ok().and_then(char::from_u32).ok_or_else(|| {
                    mlua::Error::runtime(format!(
                        "bad argument #{} to 'char' (value out of range)",
                        n + 1
                    ))
                })
            })
            .collect::<LuaResult<String>>()
    })
}

fn utf8(s: &LuaString, fname: &str) -> LuaResult<String> {
    std::str::from_utf8(&s.as_bytes()).map(str::to_owned).map_err(|_| {
        mlua::Error::runtime(format!("bad argument #1 to '{fname}' (string is not UTF-8)"))
    })
}

/// Translate Lua `i, j` indices into a half-open range over `len` items.
///
/// Returns `None` when the range is empty.
fn char_range(len: usize, i: i64, j: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let resolve = |idx: i64| if idx < 0 { len + idx + 1 } else { idx };
    let start = resolve(i).max(1);
    let end = resolve(j).min(len);
    if start > end {
        return None;
    }
    Some(((start - 1) as usize, end as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua() -> Lua {
        let lua = Lua::new();
        let t = create_ustring_table(&lua).unwrap();
        lua.globals().set("ustring", t).unwrap();
        lua
    }

    #[test]
    fn test_char_range() {
        assert_eq!(char_range(5, 1, -1), Some((0, 5)));
        assert_eq!(char_range(5, 2, 3), Some((1, 3)));
        assert_eq!(char_range(5, -2, -1), Some((3, 5)));
        assert_eq!(char_range(5, 0, 10), Some((0, 5)));
        assert_eq!(char_range(5, 4, 2), None);
        assert_eq!(char_range(0, 1, -1), None);
    }

    #[test]
    fn test_len_counts_code_points() {
        let n: i64 = lua().load(r#"return ustring.len("añb€")"#).eval().unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn test_len_invalid_utf8_is_nil() {
        let v: Option<i64> = lua().load(r#"return ustring.len("\255")"#).eval().unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn test_sub_and_codepoint() {
        let lua = lua();
        let s: String = lua.load(r#"return ustring.sub("añb€", 2, -2)"#).eval().unwrap();
        assert_eq!(s, "ñb");
        let (a, b): (i64, i64) =
            lua.load(r#"return ustring.codepoint("añ", 1, 2)"#).eval().unwrap();
        assert_eq!((a, b), (97, 241));
    }

    #[test]
    fn test_char_out_of_range_fails() {
        let lua = lua();
        let s: String = lua.load("return ustring.char(72, 0x20AC)").eval().unwrap();
        assert_eq!(s, "H€");
        let err = lua.load("return ustring.char(72, -1)").eval::<String>().unwrap_err();
        assert!(err.to_string().contains("bad argument #2 to 'char'"));
    }

    #[test]
    fn test_normalization_forms() {
        let lua = lua();
        let nfd: String = lua.load(r#"return ustring.toNFD("\u{1E0A}")"#).eval().unwrap();
        assert_eq!(nfd, "D\u{0307}");
        let nfc: String = lua.load(r#"return ustring.toNFC("D\u{0307}")"#).eval().unwrap();
        assert_eq!(nfc, "\u{1E0A}");
        let nfkc: String = lua.load(r#"return ustring.toNFKC("\u{FB01}")"#).eval().unwrap();
        assert_eq!(nfkc, "fi");
    }
}
