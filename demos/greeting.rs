use bnf_gen::{Grammar, GrammarConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;

/// Example of loading a grammar from text and sampling a few derivations
fn main() -> Result<(), Box<dyn Error>> {
    let source = include_str!("names.bnf");

    let grammar = Grammar::parse_str(source, "greeting", GrammarConfig::default())?;
    let mut rng = StdRng::seed_from_u64(7);

    println!("Greetings:");
    for i in 1..=5 {
        println!("{}. {}", i, grammar.generate(&mut rng)?);
    }

    println!("\nPIN codes:");
    for i in 1..=3 {
        println!("{}. {}", i, grammar.generate_symbol("digits", &mut rng)?);
    }

    // A grammar that only terminates by chance; cap the depth so it cannot run away
    let config = GrammarConfig {
        max_recursion_depth: Some(50),
        ..GrammarConfig::default()
    };
    let mut nested = Grammar::with_config("list", config);
    for line in [
        r#"<list> ::= "(" *3<item> ")""#,
        r#"<item> ::= "x" | <list>"#,
    ] {
        nested.add_rule_line(line)?;
    }

    println!("\nNested lists:");
    for i in 1..=3 {
        match nested.generate(&mut rng) {
            Ok(text) => println!("{}. {}", i, text),
            Err(e) => println!("{}. ({})", i, e),
        }
    }

    Ok(())
}
