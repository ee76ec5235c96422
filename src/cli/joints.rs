// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::joints::{BODY_25_PAIRS, Joint};
use crate::{info, section};

/// Table of joint indices and names, one per line.
pub(crate) fn joint_table() -> Vec<String> {
    Joint::ALL
        .iter()
        .map(|joint| format!("{:>2}  {joint}", joint.index()))
        .collect()
}

/// Print the BODY_25 joint index mapping and limb pairs.
pub fn run_joints() {
    section!("BODY_25 joints");
    for line in joint_table() {
        info!("{line}");
    }

    section!("Limbs");
    for [a, b] in BODY_25_PAIRS {
        info!("{a:>2} -> {b:>2}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_table() {
        let table = joint_table();
        assert_eq!(table.len(), 25);
        assert_eq!(table[0], " 0  OP_NOSE");
        assert_eq!(table[8], " 8  OP_MIDHIP");
        assert_eq!(table[24], "24  OP_RHEEL");
    }
}
