use colored::Colorize;
use dbx_defs::Capability;

pub fn handle_list() {
    for capability in Capability::ALL {
        let info = capability.info();
        println!(
            "{} ({}) [{}]",
            info.display_name.bold(),
            info.name,
            info.category
        );
        println!("  {}", info.description);
        println!("  Required: {}", info.required_parameters.join(", "));
        println!("  Keywords: {}", info.keywords.join(", "));
        for use_case in info.use_cases {
            println!("  - {}", use_case);
        }
    }
}
