//! Search posts from the command line

use anyhow::Result;
use std::fmt::Write;

use crate::content::ContentStore;
use crate::Articulate;

/// Print the posts matching `keyword`
pub fn run(site: &Articulate, keyword: &str) -> Result<()> {
    let store = site.load_store()?;
    print!("{}", render(&store, keyword)?);
    Ok(())
}

pub fn render(store: &ContentStore, keyword: &str) -> Result<String> {
    let results = store.search(keyword);
    let mut out = String::new();

    let noun = if results.len() == 1 { "result" } else { "results" };
    writeln!(out, "{} {} found for \"{}\"", results.len(), noun, keyword)?;
    for post in results {
        writeln!(out, "  {} [{}] ({})", post.title, post.id, post.category)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::testing::post;
    use crate::content::Category;
    use chrono::Local;

    #[test]
    fn test_search_output() {
        let store = ContentStore::new(vec![
            post("a", Category::Ai, 0, Local::now()),
            post("b", Category::Lifestyle, 0, Local::now()),
        ])
        .unwrap();

        let out = render(&store, "body of b").unwrap();
        assert_eq!(out, "1 result found for \"body of b\"\n  Post b [b] (Lifestyle)\n");

        let out = render(&store, "").unwrap();
        assert_eq!(out, "0 results found for \"\"\n");
    }
}
